use crate::baseline::{percent_change, BaselineAnalysis};
use crate::error::{ForecastError, Result};
use crate::schema::{
    ForecastPoint, ForecastReport, OverallTrend, SummaryStats, TrendClassification,
};

/// Coarse split used for the narrative; independent of the six-band classification.
pub const OVERALL_TREND_THRESHOLD: f64 = 10.0;

pub const MONITORING_NOTE: &str =
    "Keep monitoring regularly and refit the model every month to reflect new movements.";

pub fn overall_trend(overall_pct_change: f64) -> OverallTrend {
    if overall_pct_change > OVERALL_TREND_THRESHOLD {
        OverallTrend::Growth
    } else if overall_pct_change < -OVERALL_TREND_THRESHOLD {
        OverallTrend::Decline
    } else {
        OverallTrend::Stable
    }
}

fn trend_description(trend: OverallTrend) -> &'static str {
    match trend {
        OverallTrend::Growth => "a clear UPWARD trend",
        OverallTrend::Decline => "a significant DOWNWARD trend",
        OverallTrend::Stable => "a STABLE trend",
    }
}

pub fn summarize(analysis: &BaselineAnalysis) -> Result<SummaryStats> {
    let deviations = &analysis.deviations;
    if analysis.baseline == 0.0 {
        return Err(ForecastError::DegenerateBaseline {
            window: analysis.window,
        });
    }
    if deviations.is_empty() {
        return Err(ForecastError::IncompleteForecast {
            expected: 1,
            actual: 0,
        });
    }

    let estimates = deviations.iter().map(|d| d.point_estimate);
    let mean = estimates.clone().sum::<f64>() / deviations.len() as f64;
    let min = estimates.clone().fold(f64::INFINITY, f64::min);
    let max = estimates.fold(f64::NEG_INFINITY, f64::max);

    Ok(SummaryStats {
        mean,
        min,
        max,
        overall_pct_change: percent_change(mean, analysis.baseline),
    })
}

pub fn compose_narrative(horizon: usize, summary: &SummaryStats, trend: OverallTrend) -> String {
    let direction = if summary.overall_pct_change >= 0.0 {
        "up"
    } else {
        "down"
    };

    format!(
        "Over the {} forecast months, average revenue is expected to reach {:.1}, {} {:.1}% \
         versus the trailing 3-month average.\n\n\
         Forecast revenue ranges from {:.1} to {:.1}, indicating {}.",
        horizon,
        summary.mean,
        direction,
        summary.overall_pct_change.abs(),
        summary.min,
        summary.max,
        trend_description(trend)
    )
}

/// Inputs the assembler needs besides the per-period classifications.
pub struct ReportContext<'a> {
    pub product_id: &'a str,
    pub market: &'a str,
    pub forecast_horizon: usize,
    pub model_name: &'a str,
    pub fitted_points: &'a [ForecastPoint],
    /// Exactly `forecast_horizon` points, in period order.
    pub future_points: &'a [ForecastPoint],
}

pub struct ReportAssembler;

impl ReportAssembler {
    pub fn assemble(
        context: ReportContext<'_>,
        analysis: &BaselineAnalysis,
        periods: Vec<TrendClassification>,
    ) -> Result<ForecastReport> {
        let summary = summarize(analysis)?;
        let trend = overall_trend(summary.overall_pct_change);
        let narrative = compose_narrative(context.forecast_horizon, &summary, trend);

        Ok(ForecastReport {
            product_id: context.product_id.to_string(),
            market: context.market.to_string(),
            forecast_horizon: context.forecast_horizon,
            model_name: context.model_name.to_string(),
            baseline: analysis.baseline,
            periods,
            summary,
            overall_trend: trend,
            narrative,
            monitoring_note: MONITORING_NOTE.to_string(),
            forecast_points: context
                .fitted_points
                .iter()
                .chain(context.future_points)
                .cloned()
                .collect(),
        })
    }
}
