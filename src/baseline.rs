use crate::error::{ForecastError, Result};
use crate::schema::{DeviationRecord, ForecastPoint, MonthlyObservation};
use log::debug;

/// Number of trailing observed months averaged into the baseline.
pub const BASELINE_WINDOW: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct BaselineAnalysis {
    pub baseline: f64,
    /// Observations actually averaged (fewer than the window on short histories)
    pub window: usize,
    pub deviations: Vec<DeviationRecord>,
}

/// Mean revenue of the last [`BASELINE_WINDOW`] observations, or of all of them when
/// fewer exist.
pub fn trailing_baseline(history: &[MonthlyObservation]) -> Result<(f64, usize)> {
    if history.is_empty() {
        return Err(ForecastError::NoBaseline);
    }

    let window = history.len().min(BASELINE_WINDOW);
    let recent = &history[history.len() - window..];
    let baseline = recent.iter().map(|o| o.revenue).sum::<f64>() / window as f64;

    if baseline == 0.0 {
        return Err(ForecastError::DegenerateBaseline { window });
    }

    Ok((baseline, window))
}

pub fn percent_change(value: f64, baseline: f64) -> f64 {
    100.0 * (value - baseline) / baseline
}

pub fn analyze_deviations(
    history: &[MonthlyObservation],
    future: &[ForecastPoint],
) -> Result<BaselineAnalysis> {
    let (baseline, window) = trailing_baseline(history)?;
    debug!("Trailing {}-month baseline: {:.2}", window, baseline);

    let deviations = future
        .iter()
        .map(|point| DeviationRecord {
            period_start: point.period_start,
            point_estimate: point.point_estimate,
            delta: point.point_estimate - baseline,
            pct_change: percent_change(point.point_estimate, baseline),
        })
        .collect();

    Ok(BaselineAnalysis {
        baseline,
        window,
        deviations,
    })
}
