use crate::error::{ForecastError, Result};
use crate::schema::{MonthlyObservation, TransactionRecord};
use crate::utils::month_start;
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;

/// Filters transactions to one (product, market) pair and aggregates monthly revenue.
pub struct SeriesBuilder<'a> {
    product_id: &'a str,
    market: &'a str,
}

#[derive(Default)]
struct MonthBucket {
    revenue: f64,
    transaction_count: usize,
}

impl<'a> SeriesBuilder<'a> {
    pub fn new(product_id: &'a str, market: &'a str) -> Self {
        Self { product_id, market }
    }

    /// Months without a matching record are absent from the output, not zero-filled.
    /// A product and market that both exist but never co-occur produce an empty series.
    pub fn build(&self, records: &[TransactionRecord]) -> Result<Vec<MonthlyObservation>> {
        let product_known = records.iter().any(|r| r.product_id == self.product_id);
        let market_known = records.iter().any(|r| r.market == self.market);

        if !product_known || !market_known {
            let details = match (product_known, market_known) {
                (false, false) => "neither the product nor the market appears in the data",
                (false, true) => "the product does not appear in the data",
                _ => "the market does not appear in the data",
            };
            return Err(self.no_such_series(details));
        }

        let mut grid: BTreeMap<NaiveDate, MonthBucket> = BTreeMap::new();
        for record in records
            .iter()
            .filter(|r| r.product_id == self.product_id && r.market == self.market)
        {
            let bucket = grid
                .entry(month_start(record.timestamp.date()))
                .or_default();
            bucket.revenue += record.revenue();
            bucket.transaction_count += 1;
        }

        debug!(
            "Aggregated {} months for product '{}' in market '{}'",
            grid.len(),
            self.product_id,
            self.market
        );

        Ok(grid
            .into_iter()
            .map(|(period_start, bucket)| MonthlyObservation {
                period_start,
                revenue: bucket.revenue,
                transaction_count: bucket.transaction_count,
            })
            .collect())
    }

    pub(crate) fn no_such_series(&self, details: &str) -> ForecastError {
        ForecastError::NoSuchSeries {
            product_id: self.product_id.to_string(),
            market: self.market.to_string(),
            details: details.to_string(),
        }
    }
}

pub fn build_monthly_series(
    records: &[TransactionRecord],
    product_id: &str,
    market: &str,
) -> Result<Vec<MonthlyObservation>> {
    SeriesBuilder::new(product_id, market).build(records)
}
