use crate::numeric::Sign;
use crate::utils::{parse_date, round2};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct PrecisionValue {
    pub value: f64,

    #[schemars(description = "Reported precision in decimals. Absent means INF (exact).")]
    pub decimals: Option<i32>,

    pub scale: i32,

    pub unit: String,

    pub sign: Sign,

    pub format: String,
}

impl PrecisionValue {
    pub fn precision_label(&self) -> String {
        match self.decimals {
            None => "exact".to_string(),
            Some(0) => "integer".to_string(),
            Some(n) => format!("{} decimals", n),
        }
    }
}

/// The tag family a signatory was found in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SignatoryFamily {
    #[schemars(description = "Representatives signing the certification of adoption (faststallelseintyg)")]
    Certification,

    #[schemars(description = "Board members signing the annual report document itself")]
    Filing,

    #[schemars(description = "Auditors signing the audit report")]
    AuditReport,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    BoardMember,
    Chair,
    Ceo,
    Auditor,
    Representative,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Person {
    pub first_name: String,

    pub last_name: String,

    #[schemars(
        description = "Role as reported. Falls back to 'Auditor', 'Representative' or 'Board member' depending on the tag family when no role tag exists."
    )]
    pub role: String,

    #[schemars(description = "Raw role/title text from the document, if tagged")]
    pub title: Option<String>,

    pub family: SignatoryFamily,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Best-effort role classification from free text. `title` is kept for callers that
    /// need to override it.
    pub fn role_kind(&self) -> RoleKind {
        if self.family == SignatoryFamily::AuditReport {
            return RoleKind::Auditor;
        }

        let role = self.role.to_lowercase();
        if CEO_SYNONYMS.iter().any(|s| contains_word_or_phrase(&role, s)) {
            RoleKind::Ceo
        } else if CHAIR_SYNONYMS.iter().any(|s| role.contains(s)) {
            RoleKind::Chair
        } else if role.contains("revisor") || role.contains("auditor") {
            RoleKind::Auditor
        } else if self.title.is_none() && self.family == SignatoryFamily::Certification {
            RoleKind::Representative
        } else {
            RoleKind::BoardMember
        }
    }
}

const CEO_SYNONYMS: [&str; 5] = [
    "vd",
    "verkställande",
    "verkstallande",
    "ceo",
    "managing director",
];

const CHAIR_SYNONYMS: [&str; 3] = ["ordförande", "ordforande", "chair"];

// short synonyms like "vd" only count as whole words
fn contains_word_or_phrase(haystack: &str, needle: &str) -> bool {
    if needle.len() > 3 {
        return haystack.contains(needle);
    }
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == needle)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Roster {
    #[schemars(description = "Board members, chair first when one is identified")]
    pub board: Vec<Person>,

    pub auditors: Vec<Person>,

    pub ceo: Option<Person>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct KeyRatios {
    pub revenue: Option<f64>,
    pub result_after_financial_items: Option<f64>,
    pub net_income: Option<f64>,
    pub equity: Option<f64>,
    pub total_assets: Option<f64>,

    #[schemars(description = "Equity / total assets in percent")]
    pub solvency_pct: Option<f64>,

    pub employees: Option<f64>,

    #[schemars(description = "Net income / revenue in percent")]
    pub profit_margin_pct: Option<f64>,

    #[schemars(description = "Net income / equity in percent; undefined when equity is not positive")]
    pub return_on_equity_pct: Option<f64>,
}

impl KeyRatios {
    /// Fills in the derived ratios. A reported solvency figure is kept (rounded); otherwise
    /// it is derived from equity and total assets.
    pub fn compute_derived(&mut self) {
        self.solvency_pct = match (self.solvency_pct, self.equity, self.total_assets) {
            (Some(reported), _, _) => Some(round2(reported)),
            (None, Some(equity), Some(assets)) if assets > 0.0 => {
                Some(round2(equity / assets * 100.0))
            }
            _ => None,
        };

        self.profit_margin_pct = match (self.revenue, self.net_income) {
            (Some(revenue), Some(net_income)) if revenue != 0.0 => {
                Some(round2(net_income / revenue * 100.0))
            }
            _ => None,
        };

        self.return_on_equity_pct = match (self.equity, self.net_income) {
            (Some(equity), Some(net_income)) if equity > 0.0 => {
                Some(round2(net_income / equity * 100.0))
            }
            _ => None,
        };
    }

    pub fn has_activity(&self) -> bool {
        self.revenue.is_some() || self.net_income.is_some()
    }

    pub fn debt_to_equity(&self) -> Option<f64> {
        match (self.equity, self.total_assets) {
            (Some(equity), Some(assets)) if equity > 0.0 => Some((assets - equity) / equity),
            _ => None,
        }
    }
}

/// Consolidated (group) counterpart of [`KeyRatios`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct GroupRatios {
    pub revenue: Option<f64>,
    pub operating_result: Option<f64>,
    pub result_after_financial_items: Option<f64>,
    pub net_income: Option<f64>,
    pub equity: Option<f64>,
    pub total_assets: Option<f64>,
    pub minority_interest: Option<f64>,
    pub goodwill: Option<f64>,
    pub solvency_pct: Option<f64>,
}

impl GroupRatios {
    pub fn compute_derived(&mut self) {
        self.solvency_pct = match (self.equity, self.total_assets) {
            (Some(equity), Some(assets)) if assets > 0.0 => Some(round2(equity / assets * 100.0)),
            _ => None,
        };
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct StatementLine {
    pub label: String,
    pub concept: String,
    #[schemars(description = "Absent when the document does not tag this line. Never defaulted to zero.")]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct BalanceSheet {
    pub context_id: String,
    pub assets: Vec<StatementLine>,
    pub equity_and_liabilities: Vec<StatementLine>,
}

impl BalanceSheet {
    pub fn get(&self, label: &str) -> Option<f64> {
        self.assets
            .iter()
            .chain(self.equity_and_liabilities.iter())
            .find(|line| line.label == label)
            .and_then(|line| line.value)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct IncomeStatement {
    pub context_id: String,
    pub lines: Vec<StatementLine>,
}

impl IncomeStatement {
    pub fn get(&self, label: &str) -> Option<f64> {
        self.lines
            .iter()
            .find(|line| line.label == label)
            .and_then(|line| line.value)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ReportMetadata {
    pub company_name: Option<String>,
    pub organisation_number: Option<String>,
    pub fiscal_year_start: Option<String>,
    pub fiscal_year_end: Option<String>,
    pub signing_date: Option<String>,
    pub registered_seat: Option<String>,
}

impl ReportMetadata {
    pub fn fiscal_year_end_date(&self) -> Option<NaiveDate> {
        self.fiscal_year_end.as_deref().and_then(parse_date)
    }
}
