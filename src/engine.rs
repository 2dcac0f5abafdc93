use crate::chart_of_accounts::ChartOfAccounts;
use crate::config::AnalysisConfig;
use crate::disclosures::{audit_report, certification, extended_information, management_report};
use crate::document::InlineDocument;
use crate::people::roster;
use crate::registration::RegistrationStatus;
use crate::risk::{RiskEngine, RiskInput};
use crate::statements::StatementBuilder;
use crate::taxonomy::{detect_taxonomies, is_consolidated, taxonomy_warnings};
use crate::trends::TrendAnalysis;
use crate::AnnualReport;
use chrono::NaiveDate;
use log::{debug, info};

/// Runs every extraction and analysis step over one parsed document.
pub struct ReportAnalyzer<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> ReportAnalyzer<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn analyze(
        &self,
        document: &InlineDocument,
        status: Option<&RegistrationStatus>,
        as_of: NaiveDate,
    ) -> AnnualReport {
        let taxonomies = detect_taxonomies(document.lowered_source());
        let warnings = taxonomy_warnings(&taxonomies);
        let consolidated = is_consolidated(document, &taxonomies);
        debug!("Consolidated accounts: {}", consolidated);

        let builder = StatementBuilder::new(document, self.config);
        let metadata = builder.metadata();
        let key_ratios = builder.key_ratios(0);
        let multi_year = builder.multi_year();
        info!(
            "Extracted {} period(s) of key ratios for {}",
            multi_year.len(),
            metadata.company_name.as_deref().unwrap_or("unnamed company")
        );

        let history = if multi_year.is_empty() {
            vec![key_ratios.clone()]
        } else {
            multi_year.clone()
        };
        let risk = RiskEngine::new(self.config.risk.clone()).evaluate(&RiskInput {
            history: &history,
            share_capital: builder.share_capital(0),
            status,
            as_of,
        });

        AnnualReport {
            fact_count: document.facts().len(),
            taxonomy_warnings: warnings,
            consolidated,
            balance_sheet: builder.balance_sheet(0),
            income_statement: builder.income_statement(0),
            group_ratios: builder.group_ratios(consolidated, 0),
            roster: roster(document),
            management_report: management_report(document),
            audit_report: audit_report(document, consolidated),
            certification: certification(document, consolidated, &taxonomies),
            extended_information: extended_information(document),
            bas_chart: ChartOfAccounts::from_document(document),
            trends: TrendAnalysis::from_multi_year(&multi_year, &self.config.duration_context_prefix),
            taxonomies,
            metadata,
            key_ratios,
            multi_year,
            risk,
        }
    }
}
