//! `salesinsight-analytics`
//!
//! **Responsibility:** read-only analyses over a validated [`Dataset`].
//!
//! - Grouping primitives shared by every analysis ([`aggregate`]).
//! - Concentration (Pareto/ABC), period-over-period trend and target gap jobs.
//! - Reports are plain tables; where they end up is a [`ReportSink`] concern.
//!
//! [`Dataset`]: salesinsight_sales::Dataset

pub mod aggregate;
pub mod gap;
pub mod job;
pub mod pareto;
pub mod result;
pub mod runner;
pub mod sink;
pub mod trend;

pub use aggregate::{Dimension, GroupRow, KeyValue, Measure, Reducer, Row, group_by, totals_by};
pub use gap::{DetailGap, GapDrivers, GapJob, GapRecord, GrainKey, JoinMode, join_gaps};
pub use job::AnalysisJob;
pub use pareto::{AbcClass, Classification, ClassifiedEntity, ParetoJob, classify};
pub use result::{AnalysisReport, RunMetadata, Table};
pub use runner::LocalRunner;
pub use sink::{CsvDirectorySink, InMemoryReportSink, ReportSink, SinkError};
pub use trend::{TrendComparison, TrendDelta, TrendJob, TrendWindows, compare_windows, select_windows};
