use chrono::{NaiveDate, NaiveDateTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct TransactionRecord {
    #[serde(default)]
    #[schemars(description = "Invoice the line belongs to, if known")]
    pub invoice_id: Option<String>,

    #[schemars(description = "When the transaction happened")]
    pub timestamp: NaiveDateTime,

    #[schemars(description = "Product identifier (stock code)")]
    pub product_id: String,

    #[serde(default)]
    pub description: Option<String>,

    #[schemars(description = "Units sold. Negative quantities are returns and reduce revenue.")]
    pub quantity: i64,

    #[schemars(description = "Price per unit in the sale currency")]
    pub unit_price: f64,

    #[schemars(description = "Market (country) the sale was made in")]
    pub market: String,
}

impl TransactionRecord {
    pub fn revenue(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct MonthlyObservation {
    /// First day of the calendar month
    pub period_start: NaiveDate,
    /// Sum of quantity x unit price over the month's matching records
    pub revenue: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ForecastPoint {
    pub period_start: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    /// False for in-sample fitted values, true for extrapolated months
    pub is_future: bool,
}

/// Output of a single model fit: fitted history followed by the extrapolated horizon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Forecast {
    pub model_name: String,
    pub points: Vec<ForecastPoint>,
}

impl Forecast {
    /// The trailing extrapolated points, in period order.
    pub fn future(&self) -> &[ForecastPoint] {
        let first_future = self
            .points
            .iter()
            .position(|p| p.is_future)
            .unwrap_or(self.points.len());
        &self.points[first_future..]
    }

    pub fn fitted(&self) -> &[ForecastPoint] {
        let first_future = self.points.len() - self.future().len();
        &self.points[..first_future]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct DeviationRecord {
    pub period_start: NaiveDate,
    pub point_estimate: f64,
    /// point_estimate - baseline
    pub delta: f64,
    /// 100 * delta / baseline
    pub pct_change: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum TrendBand {
    #[schemars(description = "Deviation of +10% or more")]
    StrongGrowth,
    #[schemars(description = "Deviation in [+5%, +10%)")]
    ModerateGrowth,
    #[schemars(description = "Deviation in [0%, +5%)")]
    MildGrowth,
    #[schemars(description = "Deviation in (-5%, 0%)")]
    MildDecline,
    #[schemars(description = "Deviation in (-10%, -5%]")]
    StrongDecline,
    #[schemars(description = "Deviation of -10% or less")]
    SevereDecline,
}

impl TrendBand {
    pub fn label(&self) -> &'static str {
        match self {
            TrendBand::StrongGrowth => "Very strong increase",
            TrendBand::ModerateGrowth => "Strong increase",
            TrendBand::MildGrowth => "Slight increase",
            TrendBand::MildDecline => "Slight decrease",
            TrendBand::StrongDecline => "Strong decrease",
            TrendBand::SevereDecline => "Very strong decrease",
        }
    }

    pub fn is_growth(&self) -> bool {
        matches!(
            self,
            TrendBand::StrongGrowth | TrendBand::ModerateGrowth | TrendBand::MildGrowth
        )
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertFlag {
    #[schemars(description = "Point estimate is below the configured low-revenue floor")]
    LowRevenue,
    #[schemars(description = "Absolute deviation exceeds the configured volatility threshold")]
    HighVolatility,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct TrendClassification {
    pub period_start: NaiveDate,
    pub point_estimate: f64,
    pub pct_change: f64,
    pub band: TrendBand,
    pub recommended_action: String,
    pub detail_note: String,
    pub alert_flags: BTreeSet<AlertFlag>,
}

impl TrendClassification {
    pub fn has_flag(&self, flag: AlertFlag) -> bool {
        self.alert_flags.contains(&flag)
    }
}

/// Coarse direction of the whole horizon, deliberately separate from [`TrendBand`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum OverallTrend {
    Growth,
    Decline,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct SummaryStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// 100 * (mean - baseline) / baseline
    pub overall_pct_change: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ForecastReport {
    pub product_id: String,
    pub market: String,
    pub forecast_horizon: usize,
    pub model_name: String,
    pub baseline: f64,
    pub periods: Vec<TrendClassification>,
    pub summary: SummaryStats,
    pub overall_trend: OverallTrend,
    pub narrative: String,
    pub monitoring_note: String,
    /// Fitted history plus horizon, for charting
    pub forecast_points: Vec<ForecastPoint>,
}

impl ForecastReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn flagged_periods(&self, flag: AlertFlag) -> impl Iterator<Item = &TrendClassification> {
        self.periods.iter().filter(move |p| p.has_flag(flag))
    }
}
