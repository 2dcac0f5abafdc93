use crate::error::{ReportError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Whether a context covers a reporting period or a balance-sheet instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    Duration,
    Instant,
}

/// A reporting context. Lower index = more recent (0 is the current year).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
pub struct Context {
    pub kind: ContextKind,
    pub index: usize,
}

impl Context {
    pub fn duration(index: usize) -> Self {
        Self {
            kind: ContextKind::Duration,
            index,
        }
    }

    pub fn instant(index: usize) -> Self {
        Self {
            kind: ContextKind::Instant,
            index,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct RiskThresholds {
    #[schemars(
        description = "Solvency (equity / total assets, %) below which a low-solvency warning is raised. Negative solvency is always critical."
    )]
    pub low_solvency_pct: f64,

    #[schemars(description = "Year-over-year revenue decline (%) that triggers a warning.")]
    pub revenue_decline_pct: f64,

    #[schemars(description = "Debt-to-equity multiple above which a leverage warning is raised.")]
    pub debt_to_equity_max: f64,

    #[schemars(description = "Profit margin (%) below which a warning is raised. Usually negative.")]
    pub profit_margin_floor_pct: f64,

    #[schemars(description = "Companies registered fewer months ago than this get an informational flag.")]
    pub new_registration_months: u32,

    #[schemars(description = "Consecutive loss-making years that trigger a warning.")]
    pub consecutive_loss_warning: usize,

    #[schemars(description = "Consecutive loss-making years that escalate the loss flag to critical.")]
    pub consecutive_loss_critical: usize,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_solvency_pct: 20.0,
            revenue_decline_pct: 20.0,
            debt_to_equity_max: 3.0,
            profit_margin_floor_pct: -10.0,
            new_registration_months: 24,
            consecutive_loss_warning: 2,
            consecutive_loss_critical: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct AnalysisConfig {
    #[schemars(
        description = "Number of period indices (0 = current year) scanned when building the multi-year overview."
    )]
    pub max_periods: usize,

    #[schemars(description = "Prefix of duration context ids, e.g. 'period' for 'period0'.")]
    pub duration_context_prefix: String,

    #[schemars(description = "Prefix of balance-sheet instant context ids, e.g. 'balans' for 'balans0'.")]
    pub instant_context_prefix: String,

    pub risk: RiskThresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_periods: 4,
            duration_context_prefix: "period".to_string(),
            instant_context_prefix: "balans".to_string(),
            risk: RiskThresholds::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn context_id(&self, context: Context) -> String {
        let prefix = match context.kind {
            ContextKind::Duration => &self.duration_context_prefix,
            ContextKind::Instant => &self.instant_context_prefix,
        };
        format!("{}{}", prefix, context.index)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_periods == 0 {
            return Err(invalid("max_periods", "must be at least 1"));
        }
        if self.duration_context_prefix.trim().is_empty() {
            return Err(invalid("duration_context_prefix", "must not be empty"));
        }
        if self.instant_context_prefix.trim().is_empty() {
            return Err(invalid("instant_context_prefix", "must not be empty"));
        }

        let risk = &self.risk;
        if !risk.low_solvency_pct.is_finite() || risk.low_solvency_pct < 0.0 {
            return Err(invalid(
                "risk.low_solvency_pct",
                &format!("{} must be a non-negative percentage", risk.low_solvency_pct),
            ));
        }
        if !risk.revenue_decline_pct.is_finite() || risk.revenue_decline_pct <= 0.0 {
            return Err(invalid(
                "risk.revenue_decline_pct",
                &format!("{} must be a positive percentage", risk.revenue_decline_pct),
            ));
        }
        if !risk.debt_to_equity_max.is_finite() || risk.debt_to_equity_max <= 0.0 {
            return Err(invalid(
                "risk.debt_to_equity_max",
                &format!("{} must be a positive multiple", risk.debt_to_equity_max),
            ));
        }
        if !risk.profit_margin_floor_pct.is_finite() {
            return Err(invalid("risk.profit_margin_floor_pct", "must be finite"));
        }
        if risk.consecutive_loss_warning < 2 {
            return Err(invalid("risk.consecutive_loss_warning", "must be at least 2"));
        }
        if risk.consecutive_loss_critical <= risk.consecutive_loss_warning {
            return Err(invalid(
                "risk.consecutive_loss_critical",
                "must be greater than consecutive_loss_warning",
            ));
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalysisConfig)
    }
}

fn invalid(field: &str, details: &str) -> ReportError {
    ReportError::InvalidConfig {
        field: field.to_string(),
        details: details.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context_ids() {
        let config = AnalysisConfig::default();
        assert_eq!(config.context_id(Context::duration(0)), "period0");
        assert_eq!(config.context_id(Context::instant(2)), "balans2");
    }

    #[test]
    fn test_default_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config = AnalysisConfig::from_json(r#"{"max_periods": 3}"#).unwrap();
        assert_eq!(config.max_periods, 3);
        assert_eq!(config.instant_context_prefix, "balans");
        assert_eq!(config.risk.low_solvency_pct, 20.0);
    }

    #[test]
    fn test_rejects_inverted_loss_thresholds() {
        let mut config = AnalysisConfig::default();
        config.risk.consecutive_loss_critical = 2;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ReportError::InvalidConfig { ref field, .. } if field == "risk.consecutive_loss_critical"));
    }

    #[test]
    fn test_rejects_zero_periods() {
        let result = AnalysisConfig::from_json(r#"{"max_periods": 0}"#);
        assert!(result.is_err());
    }
}
