//! Schema and invariant checks for the ledger and forecast tables.
//!
//! Checks run in a fixed order and stop at the first violated rule; nothing is
//! repaired. Column checks operate on file headers, row checks on typed records.

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;

use salesinsight_core::{AnalyticsError, AnalyticsResult, ClientId, MonthKey};

use crate::record::{Channel, ForecastKey, ForecastRecord, Product, Region, SalesRecord};

/// Ledger file columns, in file order.
pub const LEDGER_COLUMNS: [&str; 10] = [
    "data",
    "mes_ref",
    "cliente_id",
    "produto",
    "canal",
    "regional",
    "quantidade",
    "receita",
    "custo",
    "desconto_pct",
];

/// Forecast file columns, in file order.
pub const FORECAST_COLUMNS: [&str; 6] = [
    "mes_ref",
    "canal",
    "regional",
    "produto",
    "meta_receita",
    "forecast_receita",
];

pub const MAX_DISCOUNT: f64 = 0.25;

/// Verify that every expected column is present in `headers`.
///
/// Extra columns are tolerated. Missing ones are reported sorted.
pub fn check_columns<'a>(
    table: &str,
    headers: impl IntoIterator<Item = &'a str>,
    expected: &[&str],
) -> AnalyticsResult<()> {
    let present: HashSet<&str> = headers.into_iter().map(str::trim).collect();
    let missing: BTreeSet<&str> = expected
        .iter()
        .copied()
        .filter(|c| !present.contains(c))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(AnalyticsError::schema(format!(
        "{table} is missing required columns: {:?}",
        missing.into_iter().collect::<Vec<_>>()
    )))
}

type RowKey = (
    NaiveDate,
    MonthKey,
    ClientId,
    Product,
    Channel,
    Region,
    u32,
    u64,
    u64,
    u64,
);

fn row_key(r: &SalesRecord) -> RowKey {
    (
        r.date,
        r.month,
        r.client_id,
        r.product,
        r.channel,
        r.region,
        r.quantity,
        r.revenue.to_bits(),
        r.cost.to_bits(),
        r.discount_pct.to_bits(),
    )
}

/// Validate the ledger's row-level invariants.
///
/// Order: nulls (non-finite numbers), duplicate rows, discount bounds,
/// strictly-positive quantity/revenue/cost, month key consistency.
pub fn validate_ledger(records: &[SalesRecord]) -> AnalyticsResult<()> {
    let nulls = records
        .iter()
        .map(|r| {
            [r.revenue, r.cost, r.discount_pct]
                .iter()
                .filter(|v| !v.is_finite())
                .count()
        })
        .sum::<usize>();
    if nulls > 0 {
        return Err(AnalyticsError::schema(format!(
            "ledger contains {nulls} null or non-numeric values"
        )));
    }

    let mut seen = HashSet::with_capacity(records.len());
    let dup = records.iter().filter(|r| !seen.insert(row_key(r))).count();
    if dup > 0 {
        return Err(AnalyticsError::integrity(format!(
            "ledger contains {dup} duplicated rows"
        )));
    }

    let out_of_range = records
        .iter()
        .filter(|r| !(0.0..=MAX_DISCOUNT).contains(&r.discount_pct))
        .count();
    if out_of_range > 0 {
        return Err(AnalyticsError::integrity(format!(
            "desconto_pct outside [0, {MAX_DISCOUNT}] in {out_of_range} rows"
        )));
    }

    let mut offending: BTreeSet<&str> = BTreeSet::new();
    for r in records {
        if r.quantity == 0 {
            offending.insert("quantidade");
        }
        if r.revenue <= 0.0 {
            offending.insert("receita");
        }
        if r.cost <= 0.0 {
            offending.insert("custo");
        }
    }
    if !offending.is_empty() {
        return Err(AnalyticsError::integrity(format!(
            "columns must be strictly positive: {:?}",
            offending.into_iter().collect::<Vec<_>>()
        )));
    }

    let mismatched = records
        .iter()
        .filter(|r| MonthKey::of(r.date) != r.month)
        .count();
    if mismatched > 0 {
        return Err(AnalyticsError::integrity(format!(
            "mes_ref disagrees with data in {mismatched} rows"
        )));
    }

    Ok(())
}

/// Validate the forecast table: no nulls and a unique composite key.
///
/// Target positivity is not checked here; the gap analysis asserts it where
/// targets are used as denominators.
pub fn validate_forecast(records: &[ForecastRecord]) -> AnalyticsResult<()> {
    let nulls = records
        .iter()
        .map(|r| {
            [r.target_revenue, r.forecast_revenue]
                .iter()
                .filter(|v| !v.is_finite())
                .count()
        })
        .sum::<usize>();
    if nulls > 0 {
        return Err(AnalyticsError::schema(format!(
            "forecast contains {nulls} null or non-numeric values"
        )));
    }

    let mut seen: HashSet<ForecastKey> = HashSet::with_capacity(records.len());
    let dup = records.iter().filter(|r| !seen.insert(r.key())).count();
    if dup > 0 {
        return Err(AnalyticsError::integrity(format!(
            "forecast contains {dup} duplicated mes_ref/canal/regional/produto keys"
        )));
    }

    Ok(())
}
