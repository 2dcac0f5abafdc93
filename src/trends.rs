use crate::error::Result;
use crate::schema::KeyRatios;
use crate::utils::round2;
use log::{info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Compound annual growth rate in percent over a most-recent-first series, rounded to
/// two decimals. The span in years runs from the newest to the oldest present value, so
/// gaps in between still count as elapsed years. Undefined unless both endpoints are
/// positive.
pub fn cagr(series: &[Option<f64>]) -> Option<f64> {
    let mut present = series
        .iter()
        .enumerate()
        .filter_map(|(index, value)| value.map(|v| (index, v)));
    let (newest_index, newest) = present.next()?;
    let (oldest_index, oldest) = present.last()?;

    if newest <= 0.0 || oldest <= 0.0 {
        return None;
    }

    let years = (oldest_index - newest_index) as f64;
    let rate = ((newest / oldest).powf(1.0 / years) - 1.0) * 100.0;
    rate.is_finite().then(|| round2(rate))
}

/// One-step-ahead ordinary least-squares forecast. The most-recent-first series is
/// reversed so that x = 0 is the oldest usable value; the fitted line is evaluated at
/// x = n.
pub fn linear_forecast(series: &[Option<f64>]) -> Option<f64> {
    let ys: Vec<f64> = series.iter().rev().flatten().copied().collect();
    let n = ys.len();
    if n < 2 {
        return None;
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = ys.iter().sum::<f64>() / n as f64;

    let (num, den) = ys
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });
    if den == 0.0 {
        return None;
    }

    let slope = num / den;
    let intercept = y_mean - slope * x_mean;
    Some(slope * n as f64 + intercept)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct MetricTrend {
    #[schemars(description = "Values per period, most recent first. Absent periods stay absent.")]
    pub values: Vec<Option<f64>>,

    pub cagr_pct: Option<f64>,

    #[schemars(description = "Linear forecast for the period after the most recent one")]
    pub forecast: Option<f64>,
}

impl MetricTrend {
    pub fn from_series(values: Vec<Option<f64>>) -> Self {
        Self {
            cagr_pct: cagr(&values),
            forecast: linear_forecast(&values),
            values,
        }
    }
}

/// Current-period key ratios of one filed report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct PeriodSnapshot {
    #[schemars(description = "Period label, typically the fiscal year end date")]
    pub period: String,
    pub ratios: KeyRatios,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct TrendAnalysis {
    pub periods: Vec<String>,
    pub revenue: MetricTrend,
    pub net_income: MetricTrend,
    pub equity: MetricTrend,
    pub employees: MetricTrend,
}

impl TrendAnalysis {
    /// Builds trends from reports filed for consecutive years, most recent first. Reports
    /// that could not be retrieved are simply missing from the input.
    pub fn from_snapshots(snapshots: Vec<PeriodSnapshot>) -> Self {
        if snapshots.len() < 2 {
            warn!(
                "Trend analysis over {} period(s); growth and forecast stay undefined",
                snapshots.len()
            );
        }

        let series = |pick: fn(&KeyRatios) -> Option<f64>| {
            MetricTrend::from_series(snapshots.iter().map(|s| pick(&s.ratios)).collect())
        };

        let analysis = Self {
            revenue: series(|r| r.revenue),
            net_income: series(|r| r.net_income),
            equity: series(|r| r.equity),
            employees: series(|r| r.employees),
            periods: snapshots.iter().map(|s| s.period.clone()).collect(),
        };

        info!("Trend analysis over {} periods", analysis.periods.len());
        analysis
    }

    /// Trends from the multi-year overview inside a single report. Periods are labelled
    /// by their context index.
    pub fn from_multi_year(multi_year: &[KeyRatios], duration_prefix: &str) -> Self {
        Self::from_snapshots(
            multi_year
                .iter()
                .enumerate()
                .map(|(index, ratios)| PeriodSnapshot {
                    period: format!("{}{}", duration_prefix, index),
                    ratios: ratios.clone(),
                })
                .collect(),
        )
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("| Period | Revenue | Net income | Equity | Employees |\n");
        output.push_str("|---|---|---|---|---|\n");

        for (i, period) in self.periods.iter().enumerate() {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                period,
                cell(&self.revenue, i),
                cell(&self.net_income, i),
                cell(&self.equity, i),
                cell(&self.employees, i)
            ));
        }

        output.push('\n');
        for (label, trend) in [("Revenue", &self.revenue), ("Equity", &self.equity)] {
            if let Some(rate) = trend.cagr_pct {
                output.push_str(&format!("- {} CAGR: {:+.1}% per year\n", label, rate));
            }
        }

        output
    }
}

fn cell(trend: &MetricTrend, index: usize) -> String {
    match trend.values.get(index).copied().flatten() {
        Some(value) => format!("{:.0}", value),
        None => "-".to_string(),
    }
}
