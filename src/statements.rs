use crate::config::{AnalysisConfig, Context};
use crate::document::InlineDocument;
use crate::schema::{
    BalanceSheet, GroupRatios, IncomeStatement, KeyRatios, ReportMetadata, StatementLine,
};
use crate::taxonomy::GROUP_CONCEPTS;
use log::debug;

const ASSET_LINES: &[(&str, &str)] = &[
    ("intangible_assets", "ImmateriellaAnlaggningstillgangar"),
    ("tangible_assets", "MateriellaAnlaggningstillgangar"),
    ("financial_assets", "FinansiellaAnlaggningstillgangar"),
    ("inventories", "VarulagerMm"),
    ("trade_receivables", "Kundfordringar"),
    ("cash_and_bank", "KassaBank"),
    ("total_current_assets", "Omsattningstillgangar"),
    ("total_assets", "Tillgangar"),
];

const EQUITY_AND_LIABILITY_LINES: &[(&str, &str)] = &[
    ("share_capital", "Aktiekapital"),
    ("retained_earnings", "BalanseratResultat"),
    ("profit_for_the_year", "AretsResultatEgetKapital"),
    ("total_equity", "EgetKapital"),
    ("long_term_liabilities", "LangfristigaSkulder"),
    ("short_term_liabilities", "KortfristigaSkulder"),
    ("trade_payables", "Leverantorsskulder"),
    ("total_liabilities", "Skulder"),
];

const INCOME_STATEMENT_LINES: &[(&str, &str)] = &[
    ("net_revenue", "Nettoomsattning"),
    ("other_operating_income", "OvrigaRorelseintakter"),
    ("total_operating_income", "RorelseintakterLagerforandringarMm"),
    ("goods_for_resale", "HandelsvarorKostnader"),
    ("other_external_expenses", "OvrigaExternaKostnader"),
    ("personnel_expenses", "Personalkostnader"),
    (
        "depreciation",
        "AvskrivningarNedskrivningarMateriellaImmateriellaAnlaggningstillgangar",
    ),
    ("operating_result", "Rorelseresultat"),
    ("financial_income", "FinansiellaIntakter"),
    ("financial_expenses", "FinansiellaKostnader"),
    ("result_after_financial_items", "ResultatEfterFinansiellaPoster"),
    ("tax", "SkattAretsResultat"),
    ("net_income", "AretsResultat"),
];

/// Group attributes read from balance-sheet instants rather than the reporting period.
const GROUP_INSTANT_ATTRIBUTES: [&str; 4] = ["equity", "total_assets", "minority_interest", "goodwill"];

pub struct StatementBuilder<'a> {
    document: &'a InlineDocument,
    config: &'a AnalysisConfig,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(document: &'a InlineDocument, config: &'a AnalysisConfig) -> Self {
        Self { document, config }
    }

    fn duration_id(&self, index: usize) -> String {
        self.config.context_id(Context::duration(index))
    }

    fn instant_id(&self, index: usize) -> String {
        self.config.context_id(Context::instant(index))
    }

    fn value(&self, pattern: &str, context_id: &str) -> Option<f64> {
        self.document.value(pattern, Some(context_id))
    }

    pub fn key_ratios(&self, index: usize) -> KeyRatios {
        let period = self.duration_id(index);
        let balance = self.instant_id(index);

        let mut ratios = KeyRatios {
            revenue: self.value("Nettoomsattning", &period),
            result_after_financial_items: self.value("ResultatEfterFinansiellaPoster", &period),
            net_income: self.value("AretsResultat", &period),
            equity: self.value("EgetKapital", &balance),
            total_assets: self
                .value("Tillgangar", &balance)
                .or_else(|| self.value("SummaEgetKapitalSkulder", &balance)),
            solvency_pct: self.value("Soliditet", &balance),
            employees: self.value("MedelantalAnstallda", &period),
            profit_margin_pct: None,
            return_on_equity_pct: None,
        };
        ratios.compute_derived();
        ratios
    }

    /// Key ratios per period, most recent first. Stops at the first period with neither
    /// revenue nor net income.
    pub fn multi_year(&self) -> Vec<KeyRatios> {
        let mut series = Vec::new();
        for index in 0..self.config.max_periods {
            let ratios = self.key_ratios(index);
            if !ratios.has_activity() {
                debug!("Multi-year overview ends at period index {}", index);
                break;
            }
            series.push(ratios);
        }
        series
    }

    pub fn balance_sheet(&self, index: usize) -> BalanceSheet {
        let context_id = self.instant_id(index);
        BalanceSheet {
            assets: self.lines(ASSET_LINES, &context_id),
            equity_and_liabilities: self.lines(EQUITY_AND_LIABILITY_LINES, &context_id),
            context_id,
        }
    }

    pub fn income_statement(&self, index: usize) -> IncomeStatement {
        let context_id = self.duration_id(index);
        IncomeStatement {
            lines: self.lines(INCOME_STATEMENT_LINES, &context_id),
            context_id,
        }
    }

    fn lines(&self, spec: &[(&str, &str)], context_id: &str) -> Vec<StatementLine> {
        spec.iter()
            .map(|(label, concept)| StatementLine {
                label: label.to_string(),
                concept: concept.to_string(),
                value: self.value(concept, context_id),
            })
            .collect()
    }

    /// Share capital at a balance instant, as needed by the equity-erosion rule.
    pub fn share_capital(&self, index: usize) -> Option<f64> {
        self.value("Aktiekapital", &self.instant_id(index))
    }

    /// Group figures, only when the document has been classified as consolidated. For each
    /// attribute the first concept with a value wins.
    pub fn group_ratios(&self, consolidated: bool, index: usize) -> Option<GroupRatios> {
        if !consolidated {
            return None;
        }

        let period = self.duration_id(index);
        let balance = self.instant_id(index);
        let mut ratios = GroupRatios::default();

        for (attribute, concepts) in GROUP_CONCEPTS {
            let context_id = if GROUP_INSTANT_ATTRIBUTES.contains(attribute) {
                &balance
            } else {
                &period
            };
            let value = concepts
                .iter()
                .find_map(|concept| self.value(concept, context_id));

            let slot = match *attribute {
                "revenue" => &mut ratios.revenue,
                "operating_result" => &mut ratios.operating_result,
                "result_after_financial_items" => &mut ratios.result_after_financial_items,
                "net_income" => &mut ratios.net_income,
                "goodwill" => &mut ratios.goodwill,
                "equity" => &mut ratios.equity,
                "minority_interest" => &mut ratios.minority_interest,
                "total_assets" => &mut ratios.total_assets,
                _ => continue,
            };
            *slot = value;
        }

        ratios.compute_derived();
        Some(ratios)
    }

    pub fn metadata(&self) -> ReportMetadata {
        let text = |pattern: &str| self.document.text(pattern, None);
        ReportMetadata {
            company_name: text("ForetagetsNamn"),
            organisation_number: text("Organisationsnummer"),
            fiscal_year_start: text("RakenskapsarForstaDag"),
            fiscal_year_end: text("RakenskapsarSistaDag"),
            signing_date: text("UndertecknandeDatum"),
            registered_seat: text("ForetagetsSate"),
        }
    }
}
