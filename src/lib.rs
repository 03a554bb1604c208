//! # Sales Revenue Forecaster
//!
//! Turns per-transaction sales records into a monthly revenue forecast for one
//! product/market pair, compares the forecast with the recent trailing average and
//! recommends an action for every forecast month.
//!
//! ## Pipeline
//!
//! - **Series**: matching transactions are summed per calendar month. Months without
//!   sales are left out, not filled with zero.
//! - **Forecast**: a [`RevenueForecaster`] fits the history and extrapolates the horizon.
//!   The default [`AdditiveForecaster`] combines a linear trend with yearly seasonality.
//! - **Baseline**: the mean of the last three observed months; every forecast month is
//!   expressed as an absolute and percentage deviation from it.
//! - **Classification**: an ordered rule table maps the deviation to one of six trend
//!   bands with an action, and raises low-revenue / high-volatility flags.
//! - **Report**: summary statistics and a narrative with a coarser growth/decline/stable
//!   verdict.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sales_revenue_forecaster::*;
//!
//! let ingested = load_transactions_csv("data/online_retail.csv")?;
//! let config = ForecastConfig::new("85123A", "United Kingdom", 3);
//!
//! let report = run_forecast(&ingested.records, &config)?;
//! println!("{}", report.narrative);
//! for period in &report.periods {
//!     println!("{}", period.suggestion_text());
//! }
//! ```

pub mod baseline;
pub mod classifier;
pub mod config;
pub mod error;
pub mod forecaster;
pub mod ingestion;
pub mod report;
pub mod schema;
pub mod seasonality;
pub mod series;
pub mod utils;

pub use baseline::{analyze_deviations, trailing_baseline, BaselineAnalysis, BASELINE_WINDOW};
pub use classifier::{BandRule, TrendClassifier, BAND_RULES};
pub use config::{ForecastConfig, ModelSettings, SeasonalityMode};
pub use error::{ForecastError, Result};
pub use forecaster::{AdditiveForecaster, MovingAverageForecaster, RevenueForecaster};
pub use ingestion::{
    distinct_markets, distinct_products, load_transactions_csv, read_transactions,
    IngestionSummary,
};
pub use report::{ReportAssembler, ReportContext};
pub use schema::*;
pub use series::{build_monthly_series, SeriesBuilder};

use log::{debug, info};

pub struct SalesForecastPipeline<'a> {
    config: &'a ForecastConfig,
}

impl<'a> SalesForecastPipeline<'a> {
    pub fn new(config: &'a ForecastConfig) -> Self {
        Self { config }
    }

    /// Runs with the additive model configured by `config.model`.
    pub fn run(&self, records: &[TransactionRecord]) -> Result<ForecastReport> {
        let forecaster = AdditiveForecaster::new(self.config.model.clone())?;
        self.run_with(records, &forecaster)
    }

    pub fn run_with<F: RevenueForecaster + ?Sized>(
        &self,
        records: &[TransactionRecord],
        forecaster: &F,
    ) -> Result<ForecastReport> {
        let config = self.config;
        config.validate()?;

        info!(
            "Forecasting {} months of revenue for product '{}' in market '{}' using {}",
            config.forecast_horizon,
            config.product_id,
            config.market,
            forecaster.name()
        );

        let builder = SeriesBuilder::new(&config.product_id, &config.market);
        let history = builder.build(records)?;
        if history.is_empty() {
            return Err(
                builder.no_such_series("no transactions match both the product and the market")
            );
        }
        debug!("History contains {} monthly observations", history.len());

        let horizon = config.forecast_horizon;
        let forecast = forecaster.forecast(&history, horizon)?;
        let future = forecast.future();
        if future.len() < horizon {
            return Err(ForecastError::IncompleteForecast {
                expected: horizon,
                actual: future.len(),
            });
        }
        let future = &future[future.len() - horizon..];

        let analysis = analyze_deviations(&history, future)?;

        let classifier =
            TrendClassifier::new(config.low_revenue_floor, config.volatility_threshold);
        let periods = classifier.classify_all(&analysis.deviations);

        let report = ReportAssembler::assemble(
            ReportContext {
                product_id: &config.product_id,
                market: &config.market,
                forecast_horizon: horizon,
                model_name: &forecast.model_name,
                fitted_points: forecast.fitted(),
                future_points: future,
            },
            &analysis,
            periods,
        )?;

        info!(
            "Forecast complete: mean {:.2} vs baseline {:.2} ({:+.1}%), overall trend {:?}",
            report.summary.mean,
            report.baseline,
            report.summary.overall_pct_change,
            report.overall_trend
        );

        Ok(report)
    }
}

pub fn run_forecast(
    records: &[TransactionRecord],
    config: &ForecastConfig,
) -> Result<ForecastReport> {
    SalesForecastPipeline::new(config).run(records)
}

pub fn run_forecast_with<F: RevenueForecaster + ?Sized>(
    records: &[TransactionRecord],
    config: &ForecastConfig,
    forecaster: &F,
) -> Result<ForecastReport> {
    SalesForecastPipeline::new(config).run_with(records, forecaster)
}
