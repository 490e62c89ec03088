use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use salesinsight_core::{AnalyticsError, AnalyticsResult};

/// First client identifier; clients are `FIRST_CLIENT_ID..FIRST_CLIENT_ID + n_clients`.
pub const FIRST_CLIENT_ID: u32 = 10_000;

/// Configuration of the synthetic data generator.
///
/// Two runs with equal configurations produce identical datasets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataGenConfig {
    /// Seed of the generator's random source.
    pub seed: u64,
    /// First calendar day that may be drawn (inclusive).
    pub start_date: NaiveDate,
    /// Last calendar day that may be drawn (inclusive).
    pub end_date: NaiveDate,
    /// Number of ledger rows.
    pub n_rows: usize,
    /// Number of distinct client identifiers to draw from.
    pub n_clients: u32,
}

impl Default for DataGenConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            n_rows: 90_000,
            n_clients: 4_500,
        }
    }
}

impl DataGenConfig {
    /// Small configuration for tests and local experiments.
    pub fn small(seed: u64) -> Self {
        Self {
            seed,
            n_rows: 2_000,
            n_clients: 150,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_rows(mut self, n_rows: usize) -> Self {
        self.n_rows = n_rows;
        self
    }

    pub fn with_clients(mut self, n_clients: u32) -> Self {
        self.n_clients = n_clients;
        self
    }

    pub fn with_date_range(mut self, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    /// Number of calendar days in the (inclusive) range.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.end_date < self.start_date {
            return Err(AnalyticsError::precondition(format!(
                "end_date {} precedes start_date {}",
                self.end_date, self.start_date
            )));
        }
        if self.n_rows == 0 {
            return Err(AnalyticsError::precondition("n_rows must be > 0"));
        }
        if self.n_clients == 0 {
            return Err(AnalyticsError::precondition("n_clients must be > 0"));
        }
        if FIRST_CLIENT_ID.checked_add(self.n_clients).is_none() {
            return Err(AnalyticsError::precondition(format!(
                "n_clients {} overflows the client id range",
                self.n_clients
            )));
        }
        Ok(())
    }
}
