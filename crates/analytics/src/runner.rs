use std::time::Instant;

use salesinsight_core::AnalyticsResult;
use salesinsight_sales::Dataset;

use crate::job::AnalysisJob;
use crate::result::{AnalysisReport, RunMetadata};

/// Runs analyses in-process, one after another, over one dataset.
///
/// Fail-fast: the first failing job aborts the run and no reports are
/// returned.
#[derive(Debug, Clone)]
pub struct LocalRunner {
    meta: RunMetadata,
}

impl LocalRunner {
    pub fn new(meta: RunMetadata) -> Self {
        Self { meta }
    }

    pub fn meta(&self) -> &RunMetadata {
        &self.meta
    }

    pub fn run(&self, job: &dyn AnalysisJob, dataset: &Dataset) -> AnalyticsResult<AnalysisReport> {
        let started = Instant::now();
        match job.run(dataset, &self.meta) {
            Ok(report) => {
                tracing::info!(
                    run_id = %self.meta.run_id,
                    analysis = job.name(),
                    resumo_rows = report.resumo.len(),
                    detalhe_rows = report.detalhe.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "analysis completed"
                );
                Ok(report)
            }
            Err(e) => {
                tracing::error!(
                    run_id = %self.meta.run_id,
                    analysis = job.name(),
                    kind = e.kind(),
                    error = %e,
                    "analysis failed"
                );
                Err(e)
            }
        }
    }

    pub fn run_all(
        &self,
        jobs: &[&dyn AnalysisJob],
        dataset: &Dataset,
    ) -> AnalyticsResult<Vec<AnalysisReport>> {
        jobs.iter().map(|job| self.run(*job, dataset)).collect()
    }
}

impl Default for LocalRunner {
    fn default() -> Self {
        Self::new(RunMetadata::now())
    }
}
