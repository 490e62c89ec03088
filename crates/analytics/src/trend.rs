use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Value as JsonValue, json};

use salesinsight_core::{AnalyticsError, AnalyticsResult, MonthKey, mean, pearson, round_to, safe_ratio};
use salesinsight_sales::Dataset;

use crate::aggregate::{Dimension, GroupRow, KeyValue, Measure, Reducer, group_by};
use crate::job::AnalysisJob;
use crate::result::{AnalysisReport, RunMetadata, Table};

/// The recent window and the window immediately preceding it, both in
/// chronological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendWindows<P> {
    pub recent: Vec<P>,
    pub prior: Vec<P>,
}

impl<P: core::fmt::Display> TrendWindows<P> {
    pub fn label(&self) -> String {
        let fmt = |ps: &[P]| {
            ps.iter()
                .map(|p| format!("'{p}'"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!("[{}] vs [{}]", fmt(&self.recent), fmt(&self.prior))
    }
}

/// Pick the last `recent` distinct periods and the `prior` periods before
/// them.
///
/// Windows are cut from whatever periods exist, so with fewer than
/// `recent + prior` periods the prior window is shortened. Either window
/// ending up empty is a degenerate input.
pub fn select_windows<P: Ord + Clone>(
    periods: impl IntoIterator<Item = P>,
    recent: usize,
    prior: usize,
) -> AnalyticsResult<TrendWindows<P>> {
    if recent == 0 || prior == 0 {
        return Err(AnalyticsError::degenerate(format!(
            "window sizes must be positive (recent={recent}, prior={prior})"
        )));
    }
    let distinct: Vec<P> = periods.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
    let n = distinct.len();
    let recent_start = n.saturating_sub(recent);
    let prior_start = recent_start.saturating_sub(prior);
    let windows = TrendWindows {
        recent: distinct[recent_start..].to_vec(),
        prior: distinct[prior_start..recent_start].to_vec(),
    };
    if windows.recent.is_empty() || windows.prior.is_empty() {
        return Err(AnalyticsError::degenerate(format!(
            "{n} distinct periods cannot fill a recent window of {recent} and a prior window of {prior}"
        )));
    }
    Ok(windows)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendDelta<K> {
    pub key: K,
    pub recent_mean: f64,
    pub prior_mean: f64,
    /// `recent_mean - prior_mean`.
    pub delta: f64,
    /// `delta / prior_mean`, or 0 when the prior mean is 0.
    pub delta_pct: f64,
}

impl<K> TrendDelta<K> {
    pub fn new(key: K, recent_mean: f64, prior_mean: f64) -> Self {
        let delta = recent_mean - prior_mean;
        Self {
            key,
            recent_mean,
            prior_mean,
            delta,
            delta_pct: safe_ratio(delta, prior_mean),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendComparison<K, P> {
    pub windows: TrendWindows<P>,
    /// Sorted by `delta` ascending (largest regression first); ties keep key
    /// order.
    pub deltas: Vec<TrendDelta<K>>,
}

/// Compare each entity's mean value in the recent window against the prior
/// window.
///
/// `rows` holds one `(entity, period, value)` triple per observed period.
/// Means are taken over the periods where the entity has a value; entities
/// absent from either window are left out.
pub fn compare_windows<K, P>(
    rows: &[(K, P, f64)],
    recent: usize,
    prior: usize,
) -> AnalyticsResult<TrendComparison<K, P>>
where
    K: Ord + Clone,
    P: Ord + Clone,
{
    let windows = select_windows(rows.iter().map(|(_, p, _)| p.clone()), recent, prior)?;
    let recent_set: BTreeSet<&P> = windows.recent.iter().collect();
    let prior_set: BTreeSet<&P> = windows.prior.iter().collect();

    let mut recent_values: BTreeMap<&K, Vec<f64>> = BTreeMap::new();
    let mut prior_values: BTreeMap<&K, Vec<f64>> = BTreeMap::new();
    for (k, p, v) in rows {
        if recent_set.contains(p) {
            recent_values.entry(k).or_default().push(*v);
        } else if prior_set.contains(p) {
            prior_values.entry(k).or_default().push(*v);
        }
    }

    let mut deltas: Vec<TrendDelta<K>> = recent_values
        .iter()
        .filter_map(|(k, rv)| {
            let pv = prior_values.get(k)?;
            Some(TrendDelta::new((*k).clone(), mean(rv)?, mean(pv)?))
        })
        .collect();
    deltas.sort_by(|a, b| a.delta.total_cmp(&b.delta));

    Ok(TrendComparison { windows, deltas })
}

/// Period-over-period revenue comparison (ad hoc variance detection).
#[derive(Debug, Clone)]
pub struct TrendJob {
    dimension: Dimension,
    recent: usize,
    prior: usize,
    top_n: usize,
}

impl TrendJob {
    pub fn new() -> Self {
        Self {
            dimension: Dimension::Product,
            recent: 2,
            prior: 3,
            top_n: 10,
        }
    }

    pub fn by(mut self, dimension: Dimension) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_windows(mut self, recent: usize, prior: usize) -> Self {
        self.recent = recent;
        self.prior = prior;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    fn monthly(&self, dataset: &Dataset) -> AnalyticsResult<Vec<(KeyValue, MonthKey, f64)>> {
        if self.dimension == Dimension::Month {
            return Err(AnalyticsError::precondition(
                "trend entities cannot be the period dimension itself",
            ));
        }
        let groups = group_by(
            dataset.ledger(),
            &[self.dimension, Dimension::Month],
            Measure::Revenue,
            Reducer::Sum,
        )?;
        Ok(groups
            .into_iter()
            .filter_map(|g: GroupRow| match g.key.as_slice() {
                [entity, period] => Some((*entity, period.as_month()?, g.value)),
                _ => None,
            })
            .collect())
    }

    pub fn compare(&self, dataset: &Dataset) -> AnalyticsResult<TrendComparison<KeyValue, MonthKey>> {
        let monthly = self.monthly(dataset)?;
        let comparison = compare_windows(&monthly, self.recent, self.prior)?;
        tracing::debug!(
            windows = %comparison.windows.label(),
            entities = comparison.deltas.len(),
            "windows compared"
        );
        Ok(comparison)
    }

    /// Correlation between each client's average ticket and average discount.
    pub fn discount_ticket_correlation(&self, dataset: &Dataset) -> AnalyticsResult<Option<f64>> {
        let ticket = group_by(dataset.ledger(), &[Dimension::Client], Measure::Revenue, Reducer::Mean)?;
        let discount = group_by(dataset.ledger(), &[Dimension::Client], Measure::Discount, Reducer::Mean)?;
        let xs: Vec<f64> = ticket.iter().map(|g| g.value).collect();
        let ys: Vec<f64> = discount.iter().map(|g| g.value).collect();
        Ok(pearson(&xs, &ys))
    }

    pub fn report(
        &self,
        monthly: &[(KeyValue, MonthKey, f64)],
        comparison: &TrendComparison<KeyValue, MonthKey>,
        correlation: Option<f64>,
        meta: &RunMetadata,
    ) -> AnalysisReport {
        let entity_col = self.dimension.column();
        let recent_col = format!("media_ultimos_{}m", self.recent);
        let prior_col = format!("media_{}m_anteriores", self.prior);

        let mut resumo = Table::new(&[
            entity_col,
            recent_col.as_str(),
            prior_col.as_str(),
            "delta_receita",
            "delta_pct",
            "insight",
        ]);
        for d in comparison.deltas.iter().take(self.top_n) {
            resumo.push(vec![
                json!(d.key.to_string()),
                json!(d.recent_mean),
                json!(d.prior_mean),
                json!(d.delta),
                json!(d.delta_pct),
                json!("Maior queda de receita versus média histórica recente"),
            ]);
        }

        let by_key: BTreeMap<&KeyValue, &TrendDelta<KeyValue>> =
            comparison.deltas.iter().map(|d| (&d.key, d)).collect();
        let mut detalhe = Table::new(&[entity_col, "mes_ref", "receita", "delta_receita", "delta_pct"]);
        for (entity, month, revenue) in monthly {
            let delta = by_key.get(entity);
            detalhe.push(vec![
                json!(entity.to_string()),
                json!(month.to_string()),
                json!(revenue),
                delta.map_or(JsonValue::Null, |d| json!(d.delta)),
                delta.map_or(JsonValue::Null, |d| json!(d.delta_pct)),
            ]);
        }

        let parametros = Table::key_value(vec![
            ("janela_comparacao", json!(comparison.windows.label())),
            (
                "correlacao_desconto_ticket",
                json!(round_to(correlation.unwrap_or(0.0), 4)),
            ),
            ("run_id", json!(meta.run_id.to_string())),
            ("data_geracao", json!(meta.timestamp_label())),
        ]);

        AnalysisReport {
            analysis: self.name().to_string(),
            resumo,
            detalhe,
            parametros,
        }
    }
}

impl Default for TrendJob {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisJob for TrendJob {
    fn name(&self) -> &'static str {
        "ad_hoc_trend"
    }

    fn run(&self, dataset: &Dataset, meta: &RunMetadata) -> AnalyticsResult<AnalysisReport> {
        let monthly = self.monthly(dataset)?;
        let comparison = compare_windows(&monthly, self.recent, self.prior)?;
        let correlation = self.discount_ticket_correlation(dataset)?;
        if correlation.is_none() {
            tracing::warn!("discount/ticket correlation undefined; reporting 0");
        }
        Ok(self.report(&monthly, &comparison, correlation, meta))
    }
}
