use salesinsight_core::AnalyticsResult;
use salesinsight_sales::Dataset;

use crate::result::{AnalysisReport, RunMetadata};

/// One analysis over the shared dataset.
///
/// Jobs only read the dataset; they may run in any order (or concurrently)
/// without coordination.
pub trait AnalysisJob: Send + Sync {
    /// Stable analysis name (e.g. `pareto_abc`).
    fn name(&self) -> &'static str;

    /// Compute the analysis and render its `resumo`/`detalhe`/`parametros`
    /// tables.
    ///
    /// Must validate its preconditions before computing and never return a
    /// partial report.
    fn run(&self, dataset: &Dataset, meta: &RunMetadata) -> AnalyticsResult<AnalysisReport>;
}
