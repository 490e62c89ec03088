use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use salesinsight_core::RunId;

/// Metadata stamped into every report's `parametros` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
}

impl RunMetadata {
    pub fn now() -> Self {
        Self {
            run_id: RunId::new(),
            generated_at: Utc::now(),
        }
    }

    pub fn fixed(run_id: RunId, generated_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            generated_at,
        }
    }

    /// `data_geracao` rendering.
    pub fn timestamp_label(&self) -> String {
        self.generated_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// A named-column result table. Cells are JSON values; `null` marks a missing
/// value (e.g. a detail row without a target).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

impl Table {
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Two-column `parametro`/`valor` table.
    pub fn key_value(entries: Vec<(&str, JsonValue)>) -> Self {
        let mut table = Self::new(&["parametro", "valor"]);
        for (k, v) in entries {
            table.push(vec![JsonValue::from(k), v]);
        }
        table
    }

    pub fn push(&mut self, row: Vec<JsonValue>) {
        debug_assert_eq!(row.len(), self.columns.len(), "row width mismatch");
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&JsonValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Value for `key` in a `parametro`/`valor` table.
    pub fn lookup(&self, key: &str) -> Option<&JsonValue> {
        self.rows
            .iter()
            .find(|r| r.first().and_then(JsonValue::as_str) == Some(key))
            .and_then(|r| r.get(1))
    }
}

/// The three result tables produced by one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Stable analysis name (used as the output directory name).
    pub analysis: String,
    pub resumo: Table,
    pub detalhe: Table,
    pub parametros: Table,
}

impl AnalysisReport {
    pub fn tables(&self) -> [(&'static str, &Table); 3] {
        [
            ("resumo", &self.resumo),
            ("detalhe", &self.detalhe),
            ("parametros", &self.parametros),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_value_lookup() {
        let t = Table::key_value(vec![("regra_abc", json!("A até 80%")), ("n", json!(3))]);
        assert_eq!(t.lookup("n"), Some(&json!(3)));
        assert_eq!(t.lookup("missing"), None);
        assert_eq!(t.cell(0, "valor"), Some(&json!("A até 80%")));
    }

    #[test]
    fn timestamp_label_format() {
        let at = DateTime::parse_from_rfc3339("2024-05-01T13:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let meta = RunMetadata::fixed(RunId::new(), at);
        assert_eq!(meta.timestamp_label(), "2024-05-01 13:04:05");
    }
}
