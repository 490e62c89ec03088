//! `salesinsight-datagen`: reproducible synthetic sales data.
//!
//! Seeds the pipeline for development and testing: a ledger of transactions
//! and a forecast table derived from it, both validated before they are
//! returned.

pub mod config;
pub mod generator;

pub use config::{DataGenConfig, FIRST_CLIENT_ID};
pub use generator::{SalesGenerator, base_price, generate_sample_data, seasonal_multiplier};
