use std::sync::Arc;

use salesinsight_core::AnalyticsResult;

use crate::record::{ForecastRecord, SalesRecord};
use crate::validate::{validate_forecast, validate_ledger};

/// Validated, immutable pair of ledger and forecast tables.
///
/// Both tables sit behind `Arc<[_]>`, so clones are cheap and every analysis
/// reads the same data without copying it or being able to mutate it.
#[derive(Debug, Clone)]
pub struct Dataset {
    ledger: Arc<[SalesRecord]>,
    forecast: Arc<[ForecastRecord]>,
}

impl Dataset {
    /// Validate both tables and freeze them.
    ///
    /// The ledger is stably sorted by date first, so insertion order among
    /// same-day rows is preserved.
    pub fn new(
        mut ledger: Vec<SalesRecord>,
        forecast: Vec<ForecastRecord>,
    ) -> AnalyticsResult<Self> {
        ledger.sort_by_key(|r| r.date);
        validate_ledger(&ledger)?;
        validate_forecast(&forecast)?;
        tracing::debug!(
            ledger_rows = ledger.len(),
            forecast_rows = forecast.len(),
            "dataset validated"
        );
        Ok(Self {
            ledger: ledger.into(),
            forecast: forecast.into(),
        })
    }

    pub fn ledger(&self) -> &[SalesRecord] {
        &self.ledger
    }

    pub fn forecast(&self) -> &[ForecastRecord] {
        &self.forecast
    }

    pub fn total_revenue(&self) -> f64 {
        self.ledger.iter().map(|r| r.revenue).sum()
    }

    pub fn total_target(&self) -> f64 {
        self.forecast.iter().map(|r| r.target_revenue).sum()
    }
}
