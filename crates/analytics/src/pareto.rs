use serde::{Deserialize, Serialize};
use serde_json::json;

use salesinsight_core::{AnalyticsError, AnalyticsResult};
use salesinsight_sales::Dataset;

use crate::aggregate::{Dimension, KeyValue, Measure, totals_by};
use crate::job::AnalysisJob;
use crate::result::{AnalysisReport, RunMetadata, Table};

/// Upper cumulative-share bound (inclusive) of class A.
pub const CLASS_A_LIMIT: f64 = 0.80;
/// Upper cumulative-share bound (inclusive) of class B.
pub const CLASS_B_LIMIT: f64 = 0.95;
/// Absorbs summation error so that a share landing on a limit stays inclusive.
const BOUNDARY_EPSILON: f64 = 1e-12;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbcClass {
    A,
    B,
    C,
}

impl AbcClass {
    pub fn for_cumulative_share(cumulative_share: f64) -> Self {
        if cumulative_share <= CLASS_A_LIMIT + BOUNDARY_EPSILON {
            AbcClass::A
        } else if cumulative_share <= CLASS_B_LIMIT + BOUNDARY_EPSILON {
            AbcClass::B
        } else {
            AbcClass::C
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AbcClass::A => "A",
            AbcClass::B => "B",
            AbcClass::C => "C",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedEntity<K> {
    pub key: K,
    pub contribution: f64,
    pub share: f64,
    pub cumulative_share: f64,
    pub class: AbcClass,
}

/// Entities in descending contribution order with their ABC classes.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification<K> {
    pub entities: Vec<ClassifiedEntity<K>>,
    pub grand_total: f64,
}

impl<K> Classification<K> {
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Share of the grand total held by the first `n` entities.
    pub fn top_n_share(&self, n: usize) -> f64 {
        let top: f64 = self.entities.iter().take(n).map(|e| e.contribution).sum();
        top / self.grand_total
    }

    /// Share of the grand total held by entities of `class`.
    pub fn class_share(&self, class: AbcClass) -> f64 {
        let sum: f64 = self
            .entities
            .iter()
            .filter(|e| e.class == class)
            .map(|e| e.contribution)
            .sum();
        sum / self.grand_total
    }

    pub fn class_count(&self, class: AbcClass) -> usize {
        self.entities.iter().filter(|e| e.class == class).count()
    }
}

/// Rank entities by contribution (descending) and assign ABC classes.
///
/// Ties keep their input order (stable sort). Cumulative share is computed as
/// running total over grand total, so an entity landing exactly on 80% is A
/// and exactly on 95% is B. The first entity is always A.
pub fn classify<K>(entities: Vec<(K, f64)>) -> AnalyticsResult<Classification<K>> {
    if entities.is_empty() {
        return Err(AnalyticsError::degenerate("no entities to classify"));
    }
    let invalid = entities
        .iter()
        .filter(|(_, v)| !v.is_finite() || *v < 0.0)
        .count();
    if invalid > 0 {
        return Err(AnalyticsError::precondition(format!(
            "{invalid} entities have a negative or non-numeric contribution"
        )));
    }
    let grand_total: f64 = entities.iter().map(|(_, v)| v).sum();
    if grand_total <= 0.0 {
        return Err(AnalyticsError::precondition(
            "grand total of contributions must be positive",
        ));
    }

    let mut sorted = entities;
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut running = 0.0;
    let entities = sorted
        .into_iter()
        .enumerate()
        .map(|(idx, (key, contribution))| {
            running += contribution;
            let cumulative_share = running / grand_total;
            // The top entity is A even when its own share exceeds the A limit.
            let class = if idx == 0 {
                AbcClass::A
            } else {
                AbcClass::for_cumulative_share(cumulative_share)
            };
            ClassifiedEntity {
                key,
                contribution,
                share: contribution / grand_total,
                cumulative_share,
                class,
            }
        })
        .collect();

    Ok(Classification {
        entities,
        grand_total,
    })
}

/// Revenue concentration (Pareto/ABC) per entity.
#[derive(Debug, Clone)]
pub struct ParetoJob {
    dimension: Dimension,
    top_n: usize,
}

impl ParetoJob {
    pub fn new() -> Self {
        Self {
            dimension: Dimension::Client,
            top_n: 10,
        }
    }

    pub fn by(mut self, dimension: Dimension) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn classify(&self, dataset: &Dataset) -> AnalyticsResult<Classification<KeyValue>> {
        let totals = totals_by(dataset.ledger(), self.dimension, Measure::Revenue)?;
        let classification = classify(totals)?;
        tracing::debug!(
            entities = classification.entity_count(),
            class_a = classification.class_count(AbcClass::A),
            class_b = classification.class_count(AbcClass::B),
            class_c = classification.class_count(AbcClass::C),
            "entities classified"
        );
        Ok(classification)
    }

    pub fn report(&self, c: &Classification<KeyValue>, meta: &RunMetadata) -> AnalysisReport {
        let mut resumo = Table::new(&["kpi", "valor"]);
        resumo.push(vec![
            json!(format!("{}_total", self.dimension.plural_label())),
            json!(c.entity_count()),
        ]);
        resumo.push(vec![json!("receita_total"), json!(c.grand_total)]);
        resumo.push(vec![
            json!(format!("top_{}_participacao", self.top_n)),
            json!(c.top_n_share(self.top_n)),
        ]);
        resumo.push(vec![
            json!("classe_A_participacao"),
            json!(c.class_share(AbcClass::A)),
        ]);

        let mut detalhe = Table::new(&[
            self.dimension.column(),
            "receita",
            "pct_receita",
            "pct_acumulado",
            "classe_abc",
        ]);
        for e in &c.entities {
            detalhe.push(vec![
                json!(e.key.to_string()),
                json!(e.contribution),
                json!(e.share),
                json!(e.cumulative_share),
                json!(e.class.as_str()),
            ]);
        }

        let parametros = Table::key_value(vec![
            ("regra_abc", json!("A até 80%, B até 95%, C restante")),
            ("dimensao", json!(self.dimension.column())),
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

impl Default for ParetoJob {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisJob for ParetoJob {
    fn name(&self) -> &'static str {
        "pareto_abc"
    }

    fn run(&self, dataset: &Dataset, meta: &RunMetadata) -> AnalyticsResult<AnalysisReport> {
        let classification = self.classify(dataset)?;
        Ok(self.report(&classification, meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn classes(c: &Classification<&str>) -> Vec<AbcClass> {
        c.entities.iter().map(|e| e.class).collect()
    }

    #[test]
    fn eighty_percent_boundary_is_inclusive() {
        let c = classify(vec![("x", 40.0), ("y", 100.0), ("z", 60.0)]).unwrap();
        let keys: Vec<&str> = c.entities.iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["y", "z", "x"]);
        let shares: Vec<f64> = c.entities.iter().map(|e| e.share).collect();
        assert_eq!(shares, vec![0.5, 0.3, 0.2]);
        let cum: Vec<f64> = c.entities.iter().map(|e| e.cumulative_share).collect();
        assert_eq!(cum, vec![0.5, 0.8, 1.0]);
        // 0.80 is inclusive for A; the tail at 1.0 lies past the B limit.
        assert_eq!(classes(&c), vec![AbcClass::A, AbcClass::A, AbcClass::C]);
        assert_eq!(c.grand_total, 200.0);
    }

    #[test]
    fn ninety_five_percent_boundary_is_inclusive() {
        let c = classify(vec![("a", 80.0), ("b", 15.0), ("c", 5.0)]).unwrap();
        assert_eq!(classes(&c), vec![AbcClass::A, AbcClass::B, AbcClass::C]);
    }

    #[test]
    fn dominant_first_entity_is_still_class_a() {
        let c = classify(vec![("big", 90.0), ("small", 10.0)]).unwrap();
        assert_eq!(c.entities[0].class, AbcClass::A);
        assert_eq!(c.entities[1].class, AbcClass::C);
    }

    #[test]
    fn ties_keep_input_order_across_the_boundary() {
        // Total 100: "first" lands on 0.80 (A), its tie "second" on 0.90 (B).
        let c = classify(vec![("top", 70.0), ("first", 10.0), ("second", 10.0), ("tail", 10.0)])
            .unwrap();
        let got: Vec<(&str, AbcClass)> = c.entities.iter().map(|e| (e.key, e.class)).collect();
        assert_eq!(
            got,
            vec![
                ("top", AbcClass::A),
                ("first", AbcClass::A),
                ("second", AbcClass::B),
                ("tail", AbcClass::C),
            ]
        );

        let swapped = classify(vec![("top", 70.0), ("second", 10.0), ("first", 10.0), ("tail", 10.0)])
            .unwrap();
        assert_eq!(swapped.entities[1].key, "second");
        assert_eq!(swapped.entities[1].class, AbcClass::A);
    }

    #[test]
    fn summary_statistics() {
        let c = classify(vec![("a", 50.0), ("b", 30.0), ("c", 15.0), ("d", 5.0)]).unwrap();
        assert_eq!(c.entity_count(), 4);
        assert!((c.top_n_share(2) - 0.8).abs() < 1e-12);
        assert!((c.class_share(AbcClass::A) - 0.8).abs() < 1e-12);
        assert_eq!(c.top_n_share(10), 1.0);
    }

    #[test]
    fn rejects_empty_and_negative_input() {
        assert!(matches!(
            classify::<&str>(vec![]),
            Err(AnalyticsError::DegenerateInput(_))
        ));
        assert!(matches!(
            classify(vec![("a", 10.0), ("b", -1.0)]),
            Err(AnalyticsError::Precondition(_))
        ));
        assert!(matches!(
            classify(vec![("a", 0.0)]),
            Err(AnalyticsError::Precondition(_))
        ));
    }

    proptest! {
        /// Property: cumulative share is non-decreasing, ends at 1 and the
        /// first entity is always class A.
        #[test]
        fn cumulative_share_is_monotone(values in prop::collection::vec(0.01f64..1_000_000.0, 1..60)) {
            let input: Vec<(usize, f64)> = values.into_iter().enumerate().collect();
            let c = classify(input).unwrap();
            prop_assert_eq!(c.entities[0].class, AbcClass::A);
            for w in c.entities.windows(2) {
                prop_assert!(w[0].cumulative_share <= w[1].cumulative_share);
                prop_assert!(w[0].contribution >= w[1].contribution);
                prop_assert!(w[0].class as u8 <= w[1].class as u8);
            }
            let last = c.entities.last().unwrap().cumulative_share;
            prop_assert!((last - 1.0).abs() < 1e-9);
        }
    }
}
