//! `salesinsight-core`: foundation building blocks for the analytics kernel.
//!
//! This crate contains **pure** primitives (no I/O): the error taxonomy,
//! identifiers, value objects and numeric guards shared by every analysis.

pub mod error;
pub mod id;
pub mod numeric;
pub mod value_object;

pub use error::{AnalyticsError, AnalyticsResult};
pub use id::{ClientId, RunId};
pub use numeric::{mean, pearson, round_to, safe_ratio};
pub use value_object::{MonthKey, ValueObject};
