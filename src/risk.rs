//! Rule-based risk flags over key ratios and, when available, the company-register status.
//!
//! Every rule is evaluated independently; several may fire for the same company. The
//! aggregate score weighs a critical flag as three warnings and ignores informational
//! flags. The banding is a presentation convention, not a regulatory measure.

use crate::config::RiskThresholds;
use crate::registration::RegistrationStatus;
use crate::schema::KeyRatios;
use crate::utils::whole_months_between;
use chrono::NaiveDate;
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskKind {
    NegativeEquity,
    EquityBelowHalfShareCapital,
    RevenueDecline,
    NegativeSolvency,
    LowSolvency,
    ConsecutiveLosses,
    HighLeverage,
    NegativeProfitMargin,
    PendingBankruptcy,
    PendingLiquidation,
    Deregistered,
    Inactive,
    AdvertisingBlock,
    NewlyRegistered,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct RiskFlag {
    pub kind: RiskKind,
    pub severity: Severity,
    pub description: String,

    #[schemars(description = "The figure(s) that triggered the rule")]
    pub value: Option<serde_json::Value>,

    pub recommendation: Option<String>,
}

impl RiskFlag {
    fn new(kind: RiskKind, severity: Severity, description: String) -> Self {
        Self {
            kind,
            severity,
            description,
            value: None,
            recommendation: None,
        }
    }

    fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = Some(value);
        self
    }

    fn recommend(mut self, recommendation: &str) -> Self {
        self.recommendation = Some(recommendation.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 3 => RiskLevel::High,
            s if s >= 1 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct RiskAssessment {
    #[schemars(description = "Fired flags, critical first, then warnings, then informational")]
    pub flags: Vec<RiskFlag>,

    #[schemars(description = "3 per critical flag plus 1 per warning")]
    pub score: u32,

    pub level: RiskLevel,
}

impl RiskAssessment {
    pub fn from_flags(mut flags: Vec<RiskFlag>) -> Self {
        flags.sort_by_key(|flag| flag.severity);
        let score: u32 = flags
            .iter()
            .map(|flag| match flag.severity {
                Severity::Critical => 3,
                Severity::Warning => 1,
                Severity::Info => 0,
            })
            .sum();

        Self {
            flags,
            score,
            level: RiskLevel::from_score(score),
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.flags.iter().filter(|f| f.severity == severity).count()
    }

    pub fn has(&self, kind: RiskKind) -> bool {
        self.flags.iter().any(|f| f.kind == kind)
    }
}

/// Everything the rules look at. `history` holds key ratios most recent first; index 0
/// is the year under analysis.
#[derive(Debug, Clone, Copy)]
pub struct RiskInput<'a> {
    pub history: &'a [KeyRatios],
    pub share_capital: Option<f64>,
    pub status: Option<&'a RegistrationStatus>,
    pub as_of: NaiveDate,
}

pub struct RiskEngine {
    thresholds: RiskThresholds,
}

impl RiskEngine {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    pub fn evaluate(&self, input: &RiskInput) -> RiskAssessment {
        let mut flags = self.financial_flags(input);
        if let Some(status) = input.status {
            flags.extend(self.status_flags(status, input.as_of));
        }

        let assessment = RiskAssessment::from_flags(flags);
        info!(
            "Risk assessment: {} critical, {} warnings, score {} ({:?})",
            assessment.count(Severity::Critical),
            assessment.count(Severity::Warning),
            assessment.score,
            assessment.level
        );
        assessment
    }

    fn financial_flags(&self, input: &RiskInput) -> Vec<RiskFlag> {
        let t = &self.thresholds;
        let current = input.history.first().cloned().unwrap_or_default();
        let previous = input.history.get(1);
        let mut flags = Vec::new();

        if let Some(equity) = current.equity {
            if equity < 0.0 {
                flags.push(
                    RiskFlag::new(
                        RiskKind::NegativeEquity,
                        Severity::Critical,
                        format!("Negative equity: {:.0} SEK", equity),
                    )
                    .with_value(json!(equity))
                    .recommend("A control balance sheet may be required under the Companies Act (ABL 25 ch.)"),
                );
            }

            if let Some(share_capital) = input.share_capital.filter(|s| *s > 0.0) {
                if equity < share_capital / 2.0 {
                    flags.push(
                        RiskFlag::new(
                            RiskKind::EquityBelowHalfShareCapital,
                            Severity::Critical,
                            format!(
                                "Equity ({:.0}) is below half of the share capital ({:.0})",
                                equity, share_capital
                            ),
                        )
                        .with_value(json!({ "equity": equity, "share_capital": share_capital }))
                        .recommend("A control balance sheet may be called for"),
                    );
                }
            }
        }

        if let (Some(now), Some(before)) = (current.revenue, previous.and_then(|p| p.revenue)) {
            if before > 0.0 {
                let change_pct = (now - before) / before * 100.0;
                if change_pct < -t.revenue_decline_pct {
                    flags.push(
                        RiskFlag::new(
                            RiskKind::RevenueDecline,
                            Severity::Warning,
                            format!(
                                "Revenue fell {:.1}% compared with the previous year",
                                change_pct.abs()
                            ),
                        )
                        .with_value(json!({ "current": now, "previous": before }))
                        .recommend("Investigate the causes of the revenue decline"),
                    );
                }
            }
        }

        if let Some(solvency) = current.solvency_pct {
            if solvency < 0.0 {
                flags.push(
                    RiskFlag::new(
                        RiskKind::NegativeSolvency,
                        Severity::Critical,
                        format!("Negative solvency: {:.1}%", solvency),
                    )
                    .with_value(json!(solvency))
                    .recommend("Liabilities exceed assets"),
                );
            } else if solvency < t.low_solvency_pct {
                flags.push(
                    RiskFlag::new(
                        RiskKind::LowSolvency,
                        Severity::Warning,
                        format!("Low solvency: {:.1}%", solvency),
                    )
                    .with_value(json!(solvency))
                    .recommend("Consider strengthening equity"),
                );
            }
        }

        let losses = consecutive_losses(input.history);
        if losses >= t.consecutive_loss_warning {
            let severity = if losses >= t.consecutive_loss_critical {
                Severity::Critical
            } else {
                Severity::Warning
            };
            flags.push(
                RiskFlag::new(
                    RiskKind::ConsecutiveLosses,
                    severity,
                    format!("Net loss {} years in a row", losses),
                )
                .with_value(json!(losses))
                .recommend("Analyse profitability and take corrective action"),
            );
        }

        if let Some(leverage) = current.debt_to_equity() {
            if leverage > t.debt_to_equity_max {
                flags.push(
                    RiskFlag::new(
                        RiskKind::HighLeverage,
                        Severity::Warning,
                        format!("High debt-to-equity ratio: {:.1}x", leverage),
                    )
                    .with_value(json!(leverage))
                    .recommend("The company is highly leveraged"),
                );
            }
        }

        if let Some(margin) = current.profit_margin_pct {
            if margin < t.profit_margin_floor_pct {
                flags.push(
                    RiskFlag::new(
                        RiskKind::NegativeProfitMargin,
                        Severity::Warning,
                        format!("Strongly negative profit margin: {:.1}%", margin),
                    )
                    .with_value(json!(margin))
                    .recommend("Revenue does not cover costs"),
                );
            }
        }

        debug!("{} financial risk flags", flags.len());
        flags
    }

    fn status_flags(&self, status: &RegistrationStatus, as_of: NaiveDate) -> Vec<RiskFlag> {
        let mut flags = Vec::new();

        if let Some(bankruptcy) = &status.pending_bankruptcy {
            flags.push(
                RiskFlag::new(
                    RiskKind::PendingBankruptcy,
                    Severity::Critical,
                    format!("Pending bankruptcy since {}", date_or_unknown(bankruptcy.date)),
                )
                .with_value(json!(bankruptcy))
                .recommend("The company is in bankruptcy proceedings. Avoid new business."),
            );
        }

        if let Some(liquidation) = &status.pending_liquidation {
            flags.push(
                RiskFlag::new(
                    RiskKind::PendingLiquidation,
                    Severity::Critical,
                    format!("Pending liquidation since {}", date_or_unknown(liquidation.date)),
                )
                .with_value(json!(liquidation))
                .recommend("The company is being wound up."),
            );
        }

        if status.is_deregistered() {
            let date = status.deregistration_date;
            let reason = status
                .deregistration_reason_text()
                .unwrap_or_else(|| "Unknown reason".to_string());
            flags.push(
                RiskFlag::new(
                    RiskKind::Deregistered,
                    Severity::Critical,
                    format!(
                        "The company is deregistered ({}) as of {}",
                        reason,
                        date_or_unknown(date)
                    ),
                )
                .with_value(json!({ "date": date, "reason": reason }))
                .recommend("The company no longer exists as a legal entity."),
            );
        }

        if status.active_organisation == Some(false) {
            flags.push(
                RiskFlag::new(
                    RiskKind::Inactive,
                    Severity::Info,
                    "The organisation is marked as not conducting business".to_string(),
                )
                .recommend("May indicate a dormant company or outdated records."),
            );
        }

        if status.advertising_block == Some(true) {
            flags.push(
                RiskFlag::new(
                    RiskKind::AdvertisingBlock,
                    Severity::Info,
                    "The company has opted out of direct advertising".to_string(),
                )
                .recommend("Cannot be contacted through addressed direct marketing."),
            );
        }

        if let Some(registered) = status.registration_date {
            let months = whole_months_between(registered, as_of);
            let limit = i32::try_from(self.thresholds.new_registration_months).unwrap_or(i32::MAX);
            if (0..limit).contains(&months) {
                flags.push(
                    RiskFlag::new(
                        RiskKind::NewlyRegistered,
                        Severity::Info,
                        format!("Newly registered company ({} months old)", months),
                    )
                    .with_value(json!(months))
                    .recommend("Limited history to assess."),
                );
            }
        }

        flags
    }
}

/// Length of the run of loss-making years starting at the most recent period.
pub fn consecutive_losses(history: &[KeyRatios]) -> usize {
    history
        .iter()
        .take_while(|ratios| ratios.net_income.is_some_and(|n| n < 0.0))
        .count()
}

fn date_or_unknown(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string())
        .unwrap_or_else(|| "unknown date".to_string())
}
