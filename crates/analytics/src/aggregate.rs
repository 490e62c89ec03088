//! Grouping and reduction over ledger and forecast rows.
//!
//! Output rows come back in ascending key order (a `BTreeMap` walk), so the
//! result is stable for any input and exact-match testable. Only key
//! combinations that occur in the input produce a row; nothing is
//! interpolated.

use std::collections::BTreeMap;

use salesinsight_core::{AnalyticsError, AnalyticsResult, ClientId, MonthKey};
use salesinsight_sales::{Channel, ForecastRecord, Product, Region, SalesRecord};

/// Grouping column.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Dimension {
    Month,
    Client,
    Product,
    Channel,
    Region,
}

impl Dimension {
    /// File column name.
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::Month => "mes_ref",
            Dimension::Client => "cliente_id",
            Dimension::Product => "produto",
            Dimension::Channel => "canal",
            Dimension::Region => "regional",
        }
    }

    /// Plural label used in report KPI names (e.g. `clientes_total`).
    pub fn plural_label(&self) -> &'static str {
        match self {
            Dimension::Month => "meses",
            Dimension::Client => "clientes",
            Dimension::Product => "produtos",
            Dimension::Channel => "canais",
            Dimension::Region => "regionais",
        }
    }
}

/// Numeric column to reduce.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Measure {
    Quantity,
    Revenue,
    Cost,
    Discount,
    Target,
    Forecast,
}

impl Measure {
    pub fn column(&self) -> &'static str {
        match self {
            Measure::Quantity => "quantidade",
            Measure::Revenue => "receita",
            Measure::Cost => "custo",
            Measure::Discount => "desconto_pct",
            Measure::Target => "meta_receita",
            Measure::Forecast => "forecast_receita",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Reducer {
    Sum,
    Mean,
}

/// One cell of a grouping key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyValue {
    Month(MonthKey),
    Client(ClientId),
    Product(Product),
    Channel(Channel),
    Region(Region),
}

impl KeyValue {
    pub fn as_month(&self) -> Option<MonthKey> {
        match self {
            KeyValue::Month(m) => Some(*m),
            _ => None,
        }
    }

    pub fn as_product(&self) -> Option<Product> {
        match self {
            KeyValue::Product(p) => Some(*p),
            _ => None,
        }
    }
}

impl core::fmt::Display for KeyValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            KeyValue::Month(v) => v.fmt(f),
            KeyValue::Client(v) => v.fmt(f),
            KeyValue::Product(v) => v.fmt(f),
            KeyValue::Channel(v) => v.fmt(f),
            KeyValue::Region(v) => v.fmt(f),
        }
    }
}

/// A table row that can be grouped.
pub trait Row {
    /// Table name used in error messages.
    const TABLE: &'static str;

    fn dimensions() -> &'static [Dimension];

    fn measures() -> &'static [Measure];

    fn key(&self, dim: Dimension) -> Option<KeyValue>;

    fn measure(&self, measure: Measure) -> Option<f64>;
}

impl Row for SalesRecord {
    const TABLE: &'static str = "ledger";

    fn dimensions() -> &'static [Dimension] {
        &[
            Dimension::Month,
            Dimension::Client,
            Dimension::Product,
            Dimension::Channel,
            Dimension::Region,
        ]
    }

    fn measures() -> &'static [Measure] {
        &[
            Measure::Quantity,
            Measure::Revenue,
            Measure::Cost,
            Measure::Discount,
        ]
    }

    fn key(&self, dim: Dimension) -> Option<KeyValue> {
        Some(match dim {
            Dimension::Month => KeyValue::Month(self.month),
            Dimension::Client => KeyValue::Client(self.client_id),
            Dimension::Product => KeyValue::Product(self.product),
            Dimension::Channel => KeyValue::Channel(self.channel),
            Dimension::Region => KeyValue::Region(self.region),
        })
    }

    fn measure(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::Quantity => Some(self.quantity as f64),
            Measure::Revenue => Some(self.revenue),
            Measure::Cost => Some(self.cost),
            Measure::Discount => Some(self.discount_pct),
            Measure::Target | Measure::Forecast => None,
        }
    }
}

impl Row for ForecastRecord {
    const TABLE: &'static str = "forecast";

    fn dimensions() -> &'static [Dimension] {
        &[
            Dimension::Month,
            Dimension::Channel,
            Dimension::Region,
            Dimension::Product,
        ]
    }

    fn measures() -> &'static [Measure] {
        &[Measure::Target, Measure::Forecast]
    }

    fn key(&self, dim: Dimension) -> Option<KeyValue> {
        match dim {
            Dimension::Month => Some(KeyValue::Month(self.month)),
            Dimension::Channel => Some(KeyValue::Channel(self.channel)),
            Dimension::Region => Some(KeyValue::Region(self.region)),
            Dimension::Product => Some(KeyValue::Product(self.product)),
            Dimension::Client => None,
        }
    }

    fn measure(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::Target => Some(self.target_revenue),
            Measure::Forecast => Some(self.forecast_revenue),
            _ => None,
        }
    }
}

/// One output row of [`group_by`].
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    /// Key cells, in the order the dimensions were requested.
    pub key: Vec<KeyValue>,
    pub value: f64,
    /// Number of input rows folded into this group.
    pub count: usize,
}

impl GroupRow {
    pub fn key_label(&self) -> String {
        self.key
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Group `rows` by `dims` (in order) and reduce `measure` with `reducer`.
///
/// An empty `dims` slice folds everything into a single group (when `rows` is
/// non-empty). Requesting a column the row type does not carry is a schema
/// error, even for empty input.
pub fn group_by<R: Row>(
    rows: &[R],
    dims: &[Dimension],
    measure: Measure,
    reducer: Reducer,
) -> AnalyticsResult<Vec<GroupRow>> {
    if let Some(d) = dims.iter().find(|d| !R::dimensions().contains(d)) {
        return Err(AnalyticsError::schema(format!(
            "{} has no column '{}'",
            R::TABLE,
            d.column()
        )));
    }
    if !R::measures().contains(&measure) {
        return Err(AnalyticsError::schema(format!(
            "{} has no numeric column '{}'",
            R::TABLE,
            measure.column()
        )));
    }

    let mut groups: BTreeMap<Vec<KeyValue>, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let key = dims
            .iter()
            .map(|d| row.key(*d))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| AnalyticsError::schema(format!("{} row lacks a key column", R::TABLE)))?;
        let value = row.measure(measure).ok_or_else(|| {
            AnalyticsError::schema(format!("{} row lacks '{}'", R::TABLE, measure.column()))
        })?;
        let slot = groups.entry(key).or_insert((0.0, 0));
        slot.0 += value;
        slot.1 += 1;
    }

    Ok(groups
        .into_iter()
        .map(|(key, (sum, count))| GroupRow {
            key,
            value: match reducer {
                Reducer::Sum => sum,
                Reducer::Mean => sum / count as f64,
            },
            count,
        })
        .collect())
}

/// Sum `measure` per single dimension, returning `(key, total)` pairs.
pub fn totals_by<R: Row>(
    rows: &[R],
    dim: Dimension,
    measure: Measure,
) -> AnalyticsResult<Vec<(KeyValue, f64)>> {
    Ok(group_by(rows, &[dim], measure, Reducer::Sum)?
        .into_iter()
        .filter_map(|g| g.key.first().copied().map(|k| (k, g.value)))
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn sale(day: (i32, u32, u32), client: u32, product: Product, revenue: f64) -> SalesRecord {
        let date = NaiveDate::from_ymd_opt(day.0, day.1, day.2).unwrap();
        SalesRecord {
            date,
            month: MonthKey::of(date),
            client_id: ClientId(client),
            product,
            channel: Channel::Online,
            region: Region::Sudeste,
            quantity: 1,
            revenue,
            cost: revenue / 2.0,
            discount_pct: 0.1,
        }
    }

    fn ledger() -> Vec<SalesRecord> {
        vec![
            sale((2024, 2, 1), 2, Product::Tablet, 10.0),
            sale((2024, 1, 3), 1, Product::Tablet, 30.0),
            sale((2024, 1, 9), 2, Product::Monitor, 20.0),
            sale((2024, 2, 4), 1, Product::Tablet, 50.0),
        ]
    }

    #[test]
    fn sums_by_single_key_in_key_order() {
        let rows = group_by(&ledger(), &[Dimension::Client], Measure::Revenue, Reducer::Sum).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, vec![KeyValue::Client(ClientId(1))]);
        assert_eq!(rows[0].value, 80.0);
        assert_eq!(rows[1].value, 30.0);
        assert_eq!(rows[1].count, 2);
    }

    #[test]
    fn means_by_composite_key() {
        let rows = group_by(
            &ledger(),
            &[Dimension::Product, Dimension::Month],
            Measure::Revenue,
            Reducer::Mean,
        )
        .unwrap();
        let labels: Vec<String> = rows.iter().map(GroupRow::key_label).collect();
        assert_eq!(labels, vec!["Tablet | 2024-01", "Tablet | 2024-02", "Monitor | 2024-01"]);
        assert_eq!(rows[1].value, 30.0);
        assert_eq!(rows[1].count, 2);
    }

    #[test]
    fn output_does_not_depend_on_input_order() {
        let mut reversed = ledger();
        reversed.reverse();
        let a = group_by(&ledger(), &[Dimension::Month], Measure::Revenue, Reducer::Sum).unwrap();
        let b = group_by(&reversed, &[Dimension::Month], Measure::Revenue, Reducer::Sum).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_dims_fold_into_one_group() {
        let rows = group_by(&ledger(), &[], Measure::Revenue, Reducer::Sum).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, 110.0);
        assert!(group_by::<SalesRecord>(&[], &[], Measure::Revenue, Reducer::Sum)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn missing_column_is_a_schema_error_even_when_empty() {
        let err = group_by::<ForecastRecord>(&[], &[Dimension::Client], Measure::Target, Reducer::Sum)
            .unwrap_err();
        assert_eq!(err, AnalyticsError::schema("forecast has no column 'cliente_id'"));
        let err = group_by(&ledger(), &[Dimension::Month], Measure::Target, Reducer::Sum).unwrap_err();
        assert!(matches!(err, AnalyticsError::Schema(_)));
    }

    #[test]
    fn forecast_rows_group_by_month() {
        let f = |m: &str, target: f64| ForecastRecord {
            month: m.parse().unwrap(),
            channel: Channel::Online,
            region: Region::Sul,
            product: Product::Software,
            target_revenue: target,
            forecast_revenue: target,
        };
        let totals = totals_by(&[f("2024-01", 5.0), f("2024-01", 7.0), f("2023-12", 1.0)], Dimension::Month, Measure::Target)
            .unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].0.to_string(), "2023-12");
        assert_eq!(totals[1].1, 12.0);
    }
}
