//! # Annual Report Analyzer
//!
//! A library for extracting normalized financial facts from inline XBRL (iXBRL) annual
//! reports filed with the Swedish Companies Registration Office, and layering ratio,
//! trend and risk analysis on top.
//!
//! ## Core Concepts
//!
//! - **Facts**: Every `ix:nonFraction` (numeric) and `ix:nonNumeric` (text) element, with its
//!   concept name, context reference and formatting attributes
//! - **Contexts**: `period{i}` for reporting periods and `balans{i}` for balance-sheet dates,
//!   where index 0 is the current fiscal year
//! - **Fuzzy Concept Matching**: Concepts are located by case-insensitive substring so that
//!   namespace prefixes and producer naming variance do not break lookups
//! - **Absence Is Not Zero**: A missing or unreadable fact is `None` all the way through;
//!   ratios and flags that need it are simply not produced
//!
//! ## Example
//!
//! ```rust,ignore
//! use annual_report_analyzer::*;
//! use chrono::NaiveDate;
//!
//! let xhtml = std::fs::read_to_string("arsredovisning.xhtml")?;
//! let as_of = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
//!
//! let report = analyze_document(&xhtml, &AnalysisConfig::default(), None, as_of)?;
//!
//! println!("Solvency: {:?}", report.key_ratios.solvency_pct);
//! for flag in &report.risk.flags {
//!     println!("[{:?}] {}", flag.severity, flag.description);
//! }
//! ```

pub mod chart_of_accounts;
pub mod config;
pub mod disclosures;
pub mod document;
pub mod engine;
pub mod error;
pub mod numeric;
pub mod people;
pub mod registration;
pub mod risk;
pub mod schema;
pub mod statements;
pub mod taxonomy;
pub mod trends;
pub mod utils;

pub use chart_of_accounts::{bas_account_range, BasMapping, ChartOfAccounts};
pub use config::{AnalysisConfig, Context, ContextKind, RiskThresholds};
pub use disclosures::*;
pub use document::{Fact, FactKind, InlineDocument};
pub use engine::ReportAnalyzer;
pub use error::{ReportError, Result};
pub use numeric::{normalize, normalize_with_precision, NumericHints, Sign};
pub use people::{persons, roster, signatories};
pub use registration::*;
pub use risk::*;
pub use schema::*;
pub use statements::StatementBuilder;
pub use taxonomy::{
    detect_taxonomies, is_consolidated, registry, taxonomy_warnings, TaxonomyCategory, TaxonomyInfo,
};
pub use trends::*;

use chrono::NaiveDate;
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Everything extracted from and derived for one annual report.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnnualReport {
    pub metadata: ReportMetadata,

    /// Registered taxonomies the document references, in registry order
    pub taxonomies: Vec<TaxonomyInfo>,

    /// Warnings for archived taxonomies
    pub taxonomy_warnings: Vec<String>,

    /// Whether the document carries group (consolidated) accounts
    pub consolidated: bool,

    /// Key ratios for the current fiscal year
    pub key_ratios: KeyRatios,

    /// Key ratios per fiscal year, most recent first
    pub multi_year: Vec<KeyRatios>,

    pub balance_sheet: BalanceSheet,
    pub income_statement: IncomeStatement,
    pub roster: Roster,
    pub group_ratios: Option<GroupRatios>,
    pub management_report: ManagementReport,
    pub audit_report: Option<AuditReport>,
    pub certification: Option<Certification>,
    pub extended_information: ExtendedInformation,
    pub bas_chart: ChartOfAccounts,

    /// Growth and forecast over the multi-year overview
    pub trends: TrendAnalysis,

    pub risk: RiskAssessment,

    /// Number of tagged facts in the document
    pub fact_count: usize,
}

impl AnnualReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn schema_as_json() -> Result<String> {
        let schema = schemars::schema_for!(AnnualReport);
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

pub struct AnnualReportProcessor;

impl AnnualReportProcessor {
    pub fn process(
        text: &str,
        config: &AnalysisConfig,
        status: Option<&RegistrationStatus>,
        as_of: NaiveDate,
    ) -> Result<AnnualReport> {
        config.validate()?;

        debug!(
            "Analysing document of {} bytes with {} period(s)",
            text.len(),
            config.max_periods
        );

        let document = InlineDocument::parse(text)?;
        let report = ReportAnalyzer::new(config).analyze(&document, status, as_of);

        info!(
            "Analysis complete: {} facts, risk level {:?} (score {})",
            report.fact_count, report.risk.level, report.risk.score
        );

        Ok(report)
    }
}

/// Parses and analyses one annual report. Fails only on malformed markup or an invalid
/// configuration; everything missing from the document is reported as absent.
pub fn analyze_document(
    text: &str,
    config: &AnalysisConfig,
    status: Option<&RegistrationStatus>,
    as_of: NaiveDate,
) -> Result<AnnualReport> {
    AnnualReportProcessor::process(text, config, status, as_of)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    #[test]
    fn test_empty_document_yields_empty_report() {
        let report = analyze_document(
            "<html><body><p>Ingen taggad information</p></body></html>",
            &AnalysisConfig::default(),
            None,
            as_of(),
        )
        .unwrap();

        assert_eq!(report.fact_count, 0);
        assert!(report.taxonomies.is_empty());
        assert!(report.multi_year.is_empty());
        assert_eq!(report.key_ratios, KeyRatios::default());
        assert!(report.risk.flags.is_empty());
        assert_eq!(report.risk.level, RiskLevel::Low);
        assert!(report.extended_information.fully_tagged);
    }

    #[test]
    fn test_malformed_markup_is_the_only_document_error() {
        let result = analyze_document("<html><body>", &AnalysisConfig::default(), None, as_of());
        assert!(matches!(result, Err(ReportError::Parse(_))));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = AnalysisConfig {
            max_periods: 0,
            ..Default::default()
        };
        let result = analyze_document("<html/>", &config, None, as_of());
        assert!(matches!(result, Err(ReportError::InvalidConfig { .. })));
    }

    #[test]
    fn test_schema_as_json() {
        let schema = AnnualReport::schema_as_json().unwrap();
        assert!(schema.contains("AnnualReport"));
        assert!(schema.contains("key_ratios"));
    }
}
