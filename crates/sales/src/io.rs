//! Comma-separated file interface for the ledger and forecast tables.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use salesinsight_core::AnalyticsError;

use crate::dataset::Dataset;
use crate::record::{ForecastRecord, SalesRecord};
use crate::validate::{FORECAST_COLUMNS, LEDGER_COLUMNS, check_columns};

#[derive(Debug, Error)]
pub enum LedgerIoError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
}

fn read_table<R, T>(table: &str, reader: R, expected: &[&str]) -> Result<Vec<T>, LedgerIoError>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    check_columns(table, rdr.headers()?.iter(), expected)?;

    let mut rows = Vec::new();
    for (idx, row) in rdr.deserialize::<T>().enumerate() {
        match row {
            Ok(r) => rows.push(r),
            // Null cells and unparsable values surface as deserialize errors.
            Err(e) if matches!(e.kind(), csv::ErrorKind::Deserialize { .. }) => {
                return Err(AnalyticsError::schema(format!(
                    "{table} row {}: {e}",
                    idx + 1
                ))
                .into());
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(rows)
}

fn write_table<W, T>(writer: W, rows: &[T]) -> Result<(), LedgerIoError>
where
    W: Write,
    T: Serialize,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_ledger<R: Read>(reader: R) -> Result<Vec<SalesRecord>, LedgerIoError> {
    read_table("ledger", reader, &LEDGER_COLUMNS)
}

pub fn read_forecast<R: Read>(reader: R) -> Result<Vec<ForecastRecord>, LedgerIoError> {
    read_table("forecast", reader, &FORECAST_COLUMNS)
}

pub fn write_ledger<W: Write>(writer: W, records: &[SalesRecord]) -> Result<(), LedgerIoError> {
    write_table(writer, records)
}

pub fn write_forecast<W: Write>(
    writer: W,
    records: &[ForecastRecord],
) -> Result<(), LedgerIoError> {
    write_table(writer, records)
}

/// Load and validate a dataset from the two files.
pub fn load_dataset(ledger_path: &Path, forecast_path: &Path) -> Result<Dataset, LedgerIoError> {
    let ledger = read_ledger(File::open(ledger_path)?)?;
    let forecast = read_forecast(File::open(forecast_path)?)?;
    tracing::info!(
        ledger = %ledger_path.display(),
        forecast = %forecast_path.display(),
        ledger_rows = ledger.len(),
        forecast_rows = forecast.len(),
        "dataset loaded"
    );
    Ok(Dataset::new(ledger, forecast)?)
}

/// Write both tables of a dataset, creating parent directories as needed.
pub fn save_dataset(
    dataset: &Dataset,
    ledger_path: &Path,
    forecast_path: &Path,
) -> Result<(), LedgerIoError> {
    for path in [ledger_path, forecast_path] {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }
    write_ledger(File::create(ledger_path)?, dataset.ledger())?;
    write_forecast(File::create(forecast_path)?, dataset.forecast())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Channel, Product, Region};

    const LEDGER: &str = "\
data,mes_ref,cliente_id,produto,canal,regional,quantidade,receita,custo,desconto_pct
2023-01-02,2023-01,10007,Notebook,Inside Sales,Centro-Oeste,2,7812.4,5120.11,0.0731
2023-01-05,2023-01,10011,Acessorios,Loja,Sul,3,1187.05,702.9,0.0
";

    #[test]
    fn reads_ledger_with_file_labels() {
        let rows = read_ledger(LEDGER.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].channel, Channel::InsideSales);
        assert_eq!(rows[0].region, Region::CentroOeste);
        assert_eq!(rows[1].product, Product::Accessories);
        assert_eq!(rows[0].month.to_string(), "2023-01");
        assert_eq!(rows[1].revenue, 1187.05);
    }

    #[test]
    fn written_ledger_has_file_column_order() {
        let rows = read_ledger(LEDGER.as_bytes()).unwrap();
        let mut out = Vec::new();
        write_ledger(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().next().unwrap(), LEDGER_COLUMNS.join(","));
        assert_eq!(read_ledger(text.as_bytes()).unwrap(), rows);
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let csv = "mes_ref,canal,regional,produto,meta_receita\n2023-01,Online,Sul,Tablet,10.0\n";
        let err = read_forecast(csv.as_bytes()).unwrap_err();
        match err {
            LedgerIoError::Analytics(AnalyticsError::Schema(msg)) => {
                assert!(msg.contains("forecast_receita"));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn null_numeric_cell_is_a_schema_error() {
        let csv = "\
mes_ref,canal,regional,produto,meta_receita,forecast_receita
2023-01,Online,Sul,Tablet,,10.0
";
        let err = read_forecast(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LedgerIoError::Analytics(AnalyticsError::Schema(_))
        ));
    }
}
