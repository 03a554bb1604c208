//! Forecasting strategies for a monthly revenue series.
//!
//! Every strategy implements [`RevenueForecaster`]: given the ordered history it returns
//! fitted values for the observed months followed by `horizon` contiguous future months.
//! A forecaster value holds configuration only; each call fits from scratch.

use crate::config::ModelSettings;
use crate::error::{ForecastError, Result};
use crate::schema::{Forecast, ForecastPoint, MonthlyObservation};
use crate::seasonality::{estimate_monthly_offsets, observed_month_count, seasonality_enabled};
use crate::utils::{following_month_starts, months_between};
use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::BTreeMap;

/// Below this many observations a fit is still attempted but is low-confidence.
pub const LOW_CONFIDENCE_HISTORY: usize = 6;

pub trait RevenueForecaster: Send + Sync {
    fn name(&self) -> &str;

    fn forecast(&self, history: &[MonthlyObservation], horizon: usize) -> Result<Forecast>;
}

/// Additive linear trend plus yearly calendar-month seasonality, with OLS prediction
/// intervals.
#[derive(Debug, Clone)]
pub struct AdditiveForecaster {
    name: String,
    settings: ModelSettings,
}

/// Parameters of one fit. Never reused across calls.
struct AdditiveFit {
    origin: NaiveDate,
    intercept: f64,
    slope: f64,
    seasonal: [f64; 12],
    sigma: f64,
    n: usize,
    t_mean: f64,
    sxx: f64,
    z: f64,
}

impl AdditiveFit {
    fn estimate(&self, period: NaiveDate) -> (f64, f64) {
        let t = months_between(self.origin, period) as f64;
        let value = self.intercept + self.slope * t + self.seasonal[period.month0() as usize];
        let spread = (1.0 + 1.0 / self.n as f64 + (t - self.t_mean).powi(2) / self.sxx).sqrt();
        (value, self.z * self.sigma * spread)
    }

    fn point(&self, period: NaiveDate, is_future: bool) -> ForecastPoint {
        let (value, half_width) = self.estimate(period);
        ForecastPoint {
            period_start: period,
            point_estimate: value,
            lower_bound: Some(value - half_width),
            upper_bound: Some(value + half_width),
            is_future,
        }
    }
}

impl AdditiveForecaster {
    pub fn new(settings: ModelSettings) -> Result<Self> {
        settings.validate()?;

        Ok(Self {
            name: format!("Additive trend + seasonality ({:?})", settings.seasonality),
            settings,
        })
    }

    fn fit(&self, history: &[(NaiveDate, f64)]) -> Result<AdditiveFit> {
        let origin = history[0].0;
        let t: Vec<f64> = history
            .iter()
            .map(|(p, _)| months_between(origin, *p) as f64)
            .collect();
        let y: Vec<f64> = history.iter().map(|(_, v)| *v).collect();
        let months: Vec<usize> = history.iter().map(|(p, _)| p.month0() as usize).collect();

        let span = months_between(origin, history[history.len() - 1].0) + 1;
        let use_seasonality = seasonality_enabled(self.settings.seasonality, span);

        let mut seasonal = [0.0; 12];
        let (mut intercept, mut slope) = fit_line(&t, &y);

        if use_seasonality {
            for _ in 0..self.settings.backfit_iterations {
                let residuals: Vec<f64> = t
                    .iter()
                    .zip(&y)
                    .map(|(ti, yi)| yi - (intercept + slope * ti))
                    .collect();
                seasonal = estimate_monthly_offsets(&months, &residuals);

                let deseasonalized: Vec<f64> = y
                    .iter()
                    .zip(&months)
                    .map(|(yi, &m)| yi - seasonal[m])
                    .collect();
                (intercept, slope) = fit_line(&t, &deseasonalized);
            }
        }

        let n = y.len();
        let sse: f64 = t
            .iter()
            .zip(&y)
            .zip(&months)
            .map(|((ti, yi), &m)| (yi - (intercept + slope * ti + seasonal[m])).powi(2))
            .sum();

        let seasonal_params = if use_seasonality {
            observed_month_count(&months).saturating_sub(1)
        } else {
            0
        };
        let params = 2 + seasonal_params;
        let sigma = if n > params {
            (sse / (n - params) as f64).sqrt()
        } else {
            0.0
        };

        let t_mean = t.iter().sum::<f64>() / n as f64;
        let sxx: f64 = t.iter().map(|ti| (ti - t_mean).powi(2)).sum();

        debug!(
            "Fitted additive model: intercept={:.3}, slope={:.3}/month, seasonality={}, sigma={:.3}",
            intercept, slope, use_seasonality, sigma
        );

        Ok(AdditiveFit {
            origin,
            intercept,
            slope,
            seasonal,
            sigma,
            n,
            t_mean,
            sxx,
            z: normal_quantile(self.settings.interval_width)?,
        })
    }
}

impl Default for AdditiveForecaster {
    fn default() -> Self {
        let settings = ModelSettings::default();
        Self {
            name: format!("Additive trend + seasonality ({:?})", settings.seasonality),
            settings,
        }
    }
}

impl RevenueForecaster for AdditiveForecaster {
    fn name(&self) -> &str {
        &self.name
    }

    fn forecast(&self, history: &[MonthlyObservation], horizon: usize) -> Result<Forecast> {
        if horizon == 0 {
            return Err(ForecastError::InvalidHorizon(horizon));
        }

        let history = ordered_history(history);
        if history.len() < 2 {
            return Err(ForecastError::InsufficientHistory {
                required: 2,
                actual: history.len(),
            });
        }
        if history.len() < LOW_CONFIDENCE_HISTORY {
            warn!(
                "Only {} months of history; forecast is low-confidence",
                history.len()
            );
        }

        let fit = self.fit(&history)?;

        let mut points: Vec<ForecastPoint> = history
            .iter()
            .map(|(period, _)| fit.point(*period, false))
            .collect();

        let last = history[history.len() - 1].0;
        for period in following_month_starts(last, horizon)? {
            points.push(fit.point(period, true));
        }

        Ok(Forecast {
            model_name: self.name.clone(),
            points,
        })
    }
}

/// Flat projection of the mean of the last `window` observations.
#[derive(Debug, Clone)]
pub struct MovingAverageForecaster {
    name: String,
    window: usize,
}

impl MovingAverageForecaster {
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(ForecastError::InvalidParameter(
                "Moving average window must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Moving average (window={})", window),
            window,
        })
    }
}

impl RevenueForecaster for MovingAverageForecaster {
    fn name(&self) -> &str {
        &self.name
    }

    fn forecast(&self, history: &[MonthlyObservation], horizon: usize) -> Result<Forecast> {
        if horizon == 0 {
            return Err(ForecastError::InvalidHorizon(horizon));
        }

        let history = ordered_history(history);
        if history.is_empty() {
            return Err(ForecastError::InsufficientHistory {
                required: 1,
                actual: 0,
            });
        }

        let values: Vec<f64> = history.iter().map(|(_, v)| *v).collect();
        let trailing_mean = |end: usize| {
            let start = end.saturating_sub(self.window);
            let slice = &values[start..end];
            slice.iter().sum::<f64>() / slice.len() as f64
        };

        let mut points: Vec<ForecastPoint> = history
            .iter()
            .enumerate()
            .map(|(i, (period, _))| ForecastPoint {
                period_start: *period,
                point_estimate: trailing_mean(i + 1),
                lower_bound: None,
                upper_bound: None,
                is_future: false,
            })
            .collect();

        let level = trailing_mean(values.len());
        let last = history[history.len() - 1].0;
        for period in following_month_starts(last, horizon)? {
            points.push(ForecastPoint {
                period_start: period,
                point_estimate: level,
                lower_bound: None,
                upper_bound: None,
                is_future: true,
            });
        }

        Ok(Forecast {
            model_name: self.name.clone(),
            points,
        })
    }
}

/// History keyed and ordered by period; duplicate periods are summed.
fn ordered_history(history: &[MonthlyObservation]) -> Vec<(NaiveDate, f64)> {
    let mut grid: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for obs in history {
        *grid.entry(obs.period_start).or_insert(0.0) += obs.revenue;
    }
    grid.into_iter().collect()
}

/// Least-squares line through (t, y). Requires at least two distinct `t`.
fn fit_line(t: &[f64], y: &[f64]) -> (f64, f64) {
    let n = t.len() as f64;
    let t_mean = t.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let (sxy, sxx) = t
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxy, sxx), (ti, yi)| {
            let dt = ti - t_mean;
            (sxy + dt * (yi - y_mean), sxx + dt * dt)
        });

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    (y_mean - slope * t_mean, slope)
}

fn normal_quantile(interval_width: f64) -> Result<f64> {
    if !(interval_width > 0.0 && interval_width < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "interval_width must be strictly between 0 and 1 (got {})",
            interval_width
        )));
    }
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| ForecastError::InvalidParameter(format!("Standard normal: {}", e)))?;
    Ok(normal.inverse_cdf(0.5 + interval_width / 2.0))
}
