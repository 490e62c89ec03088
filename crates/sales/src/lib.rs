//! Sales ledger domain module.
//!
//! Typed ledger and forecast records, the validated immutable [`Dataset`],
//! schema/invariant checks, and the comma-separated file interface.

pub mod dataset;
pub mod io;
pub mod record;
pub mod validate;

pub use dataset::Dataset;
pub use io::{LedgerIoError, load_dataset, save_dataset};
pub use record::{Channel, ForecastKey, ForecastRecord, Product, Region, SalesRecord};
pub use validate::{FORECAST_COLUMNS, LEDGER_COLUMNS, validate_forecast, validate_ledger};
