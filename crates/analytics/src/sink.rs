use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{info, warn};

use crate::result::{AnalysisReport, Table};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Destination for finished reports.
///
/// Kept apart from the computation: jobs return tables, sinks decide where
/// they go.
pub trait ReportSink: Send + Sync {
    fn emit(&self, report: &AnalysisReport) -> Result<(), SinkError>;
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryReportSink {
    inner: Mutex<Vec<AnalysisReport>>,
}

impl InMemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<AnalysisReport> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn get(&self, analysis: &str) -> Option<AnalysisReport> {
        self.all().into_iter().find(|r| r.analysis == analysis)
    }
}

impl ReportSink for InMemoryReportSink {
    fn emit(&self, report: &AnalysisReport) -> Result<(), SinkError> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(report.clone());
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    analysis: &'a str,
    tables: Vec<ManifestEntry>,
}

#[derive(Debug, Serialize)]
struct ManifestEntry {
    name: &'static str,
    file: String,
    columns: Vec<String>,
    rows: usize,
}

/// Writes each report as `<root>/<analysis>/{resumo,detalhe,parametros}.csv`.
#[derive(Debug, Clone)]
pub struct CsvDirectorySink {
    root: PathBuf,
    manifest: bool,
}

impl CsvDirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            manifest: false,
        }
    }

    /// Also write a `manifest.json` per report. A failed manifest is logged
    /// and skipped; the CSV tables are the output of record.
    pub fn with_manifest(mut self, manifest: bool) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn report_dir(&self, analysis: &str) -> PathBuf {
        self.root.join(analysis)
    }

    fn write_manifest(&self, dir: &Path, report: &AnalysisReport) -> Result<(), std::io::Error> {
        let manifest = Manifest {
            analysis: &report.analysis,
            tables: report
                .tables()
                .into_iter()
                .map(|(name, table)| ManifestEntry {
                    name,
                    file: format!("{name}.csv"),
                    columns: table.columns.clone(),
                    rows: table.len(),
                })
                .collect(),
        };
        let file = fs::File::create(dir.join("manifest.json"))?;
        serde_json::to_writer_pretty(file, &manifest).map_err(std::io::Error::from)
    }
}

impl ReportSink for CsvDirectorySink {
    fn emit(&self, report: &AnalysisReport) -> Result<(), SinkError> {
        let dir = self.report_dir(&report.analysis);
        fs::create_dir_all(&dir)?;
        for (name, table) in report.tables() {
            write_table(&dir.join(format!("{name}.csv")), table)?;
        }
        info!(analysis = %report.analysis, dir = %dir.display(), "report written");

        if self.manifest {
            if let Err(e) = self.write_manifest(&dir, report) {
                warn!(analysis = %report.analysis, error = %e, "manifest not written; skipping");
            }
        }
        Ok(())
    }
}

fn cell(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn write_table(path: &Path, table: &Table) -> Result<(), SinkError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(cell))?;
    }
    writer.flush()?;
    Ok(())
}
