use std::collections::BTreeMap;

use serde_json::{Value as JsonValue, json};

use salesinsight_core::{AnalyticsError, AnalyticsResult, round_to, safe_ratio};
use salesinsight_sales::{Dataset, Product};

use crate::aggregate::{Dimension, GroupRow, KeyValue, Measure, Reducer, group_by, totals_by};
use crate::job::AnalysisJob;
use crate::result::{AnalysisReport, RunMetadata, Table};

/// How realized rows are matched with targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum JoinMode {
    /// Every realized key must have a target.
    Complete,
    /// Realized keys without a target are kept with no target.
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GapRecord<K> {
    pub key: K,
    pub realized: f64,
    pub target: Option<f64>,
    /// `realized - target`.
    pub gap: Option<f64>,
    /// `gap / target`.
    pub gap_pct: Option<f64>,
}

impl<K> GapRecord<K> {
    fn new(key: K, realized: f64, target: Option<f64>) -> Self {
        let gap = target.map(|t| realized - t);
        let gap_pct = target.zip(gap).map(|(t, g)| safe_ratio(g, t));
        Self {
            key,
            realized,
            target,
            gap,
            gap_pct,
        }
    }
}

/// Join realized values with targets on their key and compute the gaps.
///
/// Output follows the order of `realized`. Every target that ends up used
/// must be strictly positive.
pub fn join_gaps<K: Ord + Clone + core::fmt::Display>(
    realized: &[(K, f64)],
    targets: &[(K, f64)],
    mode: JoinMode,
) -> AnalyticsResult<Vec<GapRecord<K>>> {
    let targets: BTreeMap<&K, f64> = targets.iter().map(|(k, v)| (k, *v)).collect();

    if mode == JoinMode::Complete {
        let missing: Vec<String> = realized
            .iter()
            .filter(|(k, _)| !targets.contains_key(k))
            .map(|(k, _)| k.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AnalyticsError::precondition(format!(
                "no target for: {}",
                missing.join(", ")
            )));
        }
    }

    let invalid: Vec<String> = realized
        .iter()
        .filter_map(|(k, _)| targets.get(k).map(|t| (k, *t)))
        .filter(|(_, t)| !t.is_finite() || *t <= 0.0)
        .map(|(k, t)| format!("{k}={t}"))
        .collect();
    if !invalid.is_empty() {
        return Err(AnalyticsError::precondition(format!(
            "targets must be strictly positive: {}",
            invalid.join(", ")
        )));
    }

    Ok(realized
        .iter()
        .map(|(k, v)| GapRecord::new(k.clone(), *v, targets.get(k).copied()))
        .collect())
}

/// Products whose summed gap against target is the most negative and the most
/// positive.
#[derive(Debug, Clone, PartialEq)]
pub struct GapDrivers {
    pub worst: (Product, f64),
    pub best: (Product, f64),
}

impl GapDrivers {
    /// Only detail rows with a gap count. `None` if there are none.
    pub fn from_detail(detail: &[DetailGap]) -> Option<Self> {
        let mut per_product: BTreeMap<Product, f64> = BTreeMap::new();
        for d in detail {
            if let Some(g) = d.target_gap.gap {
                *per_product.entry(d.product).or_insert(0.0) += g;
            }
        }
        let mut iter = per_product.into_iter();
        let first = iter.next()?;
        let (worst, best) = iter.fold((first, first), |(worst, best), cur| {
            (
                if cur.1 < worst.1 { cur } else { worst },
                if cur.1 > best.1 { cur } else { best },
            )
        });
        Some(Self { worst, best })
    }
}

/// Composite key of a detail row, in grain order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GrainKey(pub Vec<KeyValue>);

impl core::fmt::Display for GrainKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let labels: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&labels.join(" | "))
    }
}

/// One month×channel×region×product row.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailGap {
    pub product: Product,
    pub target_gap: GapRecord<GrainKey>,
    pub forecast: Option<f64>,
    pub forecast_gap: Option<f64>,
}

const DETAIL_GRAIN: [Dimension; 4] = [
    Dimension::Month,
    Dimension::Channel,
    Dimension::Region,
    Dimension::Product,
];

/// Realized revenue versus target (and forecast).
#[derive(Debug, Clone, Default)]
pub struct GapJob;

impl GapJob {
    pub fn new() -> Self {
        Self
    }

    pub fn monthly(&self, dataset: &Dataset) -> AnalyticsResult<Vec<GapRecord<KeyValue>>> {
        let realized = totals_by(dataset.ledger(), Dimension::Month, Measure::Revenue)?;
        let targets = totals_by(dataset.forecast(), Dimension::Month, Measure::Target)?;
        join_gaps(&realized, &targets, JoinMode::Complete)
    }

    pub fn detail(&self, dataset: &Dataset) -> AnalyticsResult<Vec<DetailGap>> {
        let realized = keyed(group_by(dataset.ledger(), &DETAIL_GRAIN, Measure::Revenue, Reducer::Sum)?);
        let targets = keyed(group_by(dataset.forecast(), &DETAIL_GRAIN, Measure::Target, Reducer::Sum)?);
        let forecasts: BTreeMap<GrainKey, f64> =
            keyed(group_by(dataset.forecast(), &DETAIL_GRAIN, Measure::Forecast, Reducer::Sum)?)
                .into_iter()
                .collect();

        let gaps = join_gaps(&realized, &targets, JoinMode::Left)?;
        let unmatched = gaps.iter().filter(|g| g.target.is_none()).count();
        if unmatched > 0 {
            tracing::warn!(unmatched, "detail rows without a target");
        }

        Ok(gaps
            .into_iter()
            .filter_map(|g| {
                let product = g.key.0.last()?.as_product()?;
                let forecast = forecasts.get(&g.key).copied();
                Some(DetailGap {
                    product,
                    forecast,
                    forecast_gap: forecast.map(|f| g.realized - f),
                    target_gap: g,
                })
            })
            .collect())
    }

    pub fn report(
        &self,
        monthly: &[GapRecord<KeyValue>],
        detail: &[DetailGap],
        meta: &RunMetadata,
    ) -> AnalysisReport {
        let opt = |v: Option<f64>| v.map_or(JsonValue::Null, |x| json!(x));

        let mut resumo = Table::new(&["mes_ref", "realizado", "meta", "gap", "gap_pct"]);
        for g in monthly {
            resumo.push(vec![
                json!(g.key.to_string()),
                json!(g.realized),
                opt(g.target),
                opt(g.gap),
                opt(g.gap_pct.map(|p| round_to(p, 4))),
            ]);
        }

        let mut detalhe = Table::new(&[
            "mes_ref",
            "canal",
            "regional",
            "produto",
            "realizado",
            "meta_receita",
            "forecast_receita",
            "gap_meta",
            "gap_pct",
            "gap_forecast",
        ]);
        for d in detail {
            let mut row: Vec<JsonValue> =
                d.target_gap.key.0.iter().map(|k| json!(k.to_string())).collect();
            row.extend([
                json!(d.target_gap.realized),
                opt(d.target_gap.target),
                opt(d.forecast),
                opt(d.target_gap.gap),
                opt(d.target_gap.gap_pct.map(|p| round_to(p, 4))),
                opt(d.forecast_gap),
            ]);
            detalhe.push(row);
        }

        let mut params = vec![
            ("granularidade", json!("mensal + mes x canal x regional x produto")),
            ("fonte_meta", json!("forecast_mensal")),
        ];
        if let Some(drivers) = GapDrivers::from_detail(detail) {
            params.push(("pior_produto_gap", json!(drivers.worst.0.as_str())));
            params.push(("melhor_produto_gap", json!(drivers.best.0.as_str())));
        }
        params.push(("run_id", json!(meta.run_id.to_string())));
        params.push(("data_geracao", json!(meta.timestamp_label())));

        AnalysisReport {
            analysis: self.name().to_string(),
            resumo,
            detalhe,
            parametros: Table::key_value(params),
        }
    }
}

impl AnalysisJob for GapJob {
    fn name(&self) -> &'static str {
        "gap_meta"
    }

    fn run(&self, dataset: &Dataset, meta: &RunMetadata) -> AnalyticsResult<AnalysisReport> {
        let monthly = self.monthly(dataset)?;
        let detail = self.detail(dataset)?;
        Ok(self.report(&monthly, &detail, meta))
    }
}

fn keyed(rows: Vec<GroupRow>) -> Vec<(GrainKey, f64)> {
    rows.into_iter().map(|g| (GrainKey(g.key), g.value)).collect()
}
