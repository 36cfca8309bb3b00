use std::sync::Arc;

use tracing::{info, warn};

use abridge_core::budget::{Budget, DEFAULT_UNITS_PER_GROUP};
use abridge_core::compressor::Compressor;
use abridge_core::estimator::TokenEstimator;
use abridge_core::group::compute_groups;
use abridge_core::observer::{CondenseObserver, NullObserver};
use abridge_core::stage::Layer;
use abridge_core::unit::{merge_texts, Unit, UnitId};

use abridge_llm::prompt::condensation_prompt;

use crate::error::EngineError;

/// Result of running reduction layers to the convergence point.
pub struct Converged {
    pub units: Vec<Unit>,
    pub layer: Layer,
    /// The last layer was a single group, so its lone output is already
    /// a complete condensation.
    pub condensed: bool,
}

/// The hierarchical reduction engine.
///
/// Takes an ordered unit sequence and condenses it until the merged text
/// fits the input budget, grouping positionally when it does not. All
/// capabilities are injected; nothing here reads configuration or holds
/// global state.
pub struct Reducer {
    compressor: Arc<dyn Compressor>,
    estimator: Arc<dyn TokenEstimator>,
    observer: Arc<dyn CondenseObserver>,
    budget: Budget,
    units_per_group: usize,
}

impl Reducer {
    pub fn new(compressor: Arc<dyn Compressor>, estimator: Arc<dyn TokenEstimator>) -> Self {
        Self {
            compressor,
            estimator,
            observer: Arc::new(NullObserver),
            budget: Budget::default(),
            units_per_group: DEFAULT_UNITS_PER_GROUP,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn CondenseObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    /// Group size 1 would never shrink a layer, so it is rejected.
    pub fn with_units_per_group(mut self, units_per_group: usize) -> Self {
        assert!(units_per_group >= 2, "units_per_group must be at least 2");
        self.units_per_group = units_per_group;
        self
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn estimator(&self) -> &dyn TokenEstimator {
        self.estimator.as_ref()
    }

    /// One compressor call on one unit's text, with ratio and usage
    /// recording. Shared by every stage and every reduction layer.
    pub async fn condense_unit(
        &self,
        stage: &str,
        id: &UnitId,
        text: &str,
    ) -> Result<String, EngineError> {
        let estimate = self.estimator.estimate(text);
        if estimate > self.budget.max_input_tokens {
            warn!(
                stage,
                unit = id.as_str(),
                estimate,
                limit = self.budget.max_input_tokens,
                "unit exceeds the input budget, condensing it alone"
            );
        }

        let prompt = condensation_prompt(text);
        let compression = self.compressor.compress(&prompt).await?;

        self.observer.record_ratio(
            stage,
            id.as_str(),
            text.chars().count(),
            compression.text.chars().count(),
        );
        if let Some(usage) = &compression.usage {
            self.observer
                .record_usage(stage, id.as_str(), self.compressor.model(), usage);
        }

        Ok(compression.text)
    }

    /// Run reduction layers until the merged text fits the input budget,
    /// returning the converged units without the final call. The novel
    /// stage intercepts this point to apply output-budget splitting.
    ///
    /// When a layer collapses into a single group, that group's output is
    /// already a complete condensation of everything below it, so the
    /// result comes back with `condensed` set and needs no further call.
    pub async fn reduce_layers(
        &self,
        base_label: &str,
        mut units: Vec<Unit>,
    ) -> Result<Converged, EngineError> {
        if units.is_empty() {
            return Err(EngineError::EmptyInput);
        }

        let mut layer = Layer(0);
        loop {
            let texts: Vec<&str> = units.iter().map(|u| u.text.as_str()).collect();
            let merged = merge_texts(&texts);
            let estimate = self.estimator.estimate(&merged);
            let label = layer.label(base_label);
            info!(
                layer = label.as_str(),
                units = units.len(),
                estimate,
                "reduction layer"
            );

            if estimate <= self.budget.max_input_tokens {
                return Ok(Converged {
                    units,
                    layer,
                    condensed: false,
                });
            }

            // A lone unit cannot be grouped further; the final call will
            // send it alone and log the oversize condition.
            if units.len() == 1 {
                return Ok(Converged {
                    units,
                    layer,
                    condensed: false,
                });
            }

            let ranges = compute_groups(units.len(), self.units_per_group);
            info!(
                layer = label.as_str(),
                groups = ranges.len(),
                limit = self.budget.max_input_tokens,
                "input exceeds the budget, condensing an intermediate layer"
            );

            let single_group = ranges.len() == 1;
            let mut next = Vec::with_capacity(ranges.len());
            for (index, range) in ranges.iter().enumerate() {
                let members: Vec<&str> = units[range.clone()]
                    .iter()
                    .map(|u| u.text.as_str())
                    .collect();
                let id = UnitId::for_group(&label, index + 1);
                info!(
                    layer = label.as_str(),
                    group = index + 1,
                    of = ranges.len(),
                    members = members.len(),
                    "condensing intermediate group"
                );
                let condensed = self
                    .condense_unit(&label, &id, &merge_texts(&members))
                    .await?;
                next.push(Unit::new(id, condensed));
            }

            layer = layer.next();
            if single_group {
                return Ok(Converged {
                    units: next,
                    layer,
                    condensed: true,
                });
            }
            units = next;
        }
    }

    /// Full reduction to a single output blob.
    pub async fn reduce(&self, base_label: &str, units: Vec<Unit>) -> Result<String, EngineError> {
        let converged = self.reduce_layers(base_label, units).await?;
        if converged.condensed {
            let mut units = converged.units;
            return Ok(units.swap_remove(0).text);
        }
        let texts: Vec<&str> = converged.units.iter().map(|u| u.text.as_str()).collect();
        let merged = merge_texts(&texts);
        let label = converged.layer.label(base_label);
        let id = UnitId::from_raw(format!("{label}_merged"));
        self.condense_unit(&label, &id, &merged).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abridge_core::estimator::CharsPerTokenEstimator;
    use abridge_llm::mock::{EchoCompressor, HalvingCompressor};

    fn units(texts: &[&str]) -> Vec<Unit> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Unit::new(UnitId::for_group("unit", i + 1), *t))
            .collect()
    }

    fn reducer(compressor: Arc<dyn Compressor>, max_input_tokens: usize) -> Reducer {
        Reducer::new(compressor, Arc::new(CharsPerTokenEstimator::new(1))).with_budget(Budget {
            max_input_tokens,
            ..Budget::default()
        })
    }

    #[tokio::test]
    async fn empty_input_is_an_error() {
        let r = reducer(Arc::new(EchoCompressor::new()), 100);
        assert!(matches!(
            r.reduce("arc", vec![]).await,
            Err(EngineError::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn base_case_preserves_order_in_one_call() {
        let echo = Arc::new(EchoCompressor::new());
        let r = reducer(echo.clone(), 1_000_000).with_units_per_group(2);
        let out = r
            .reduce("arc", units(&["A", "B", "C", "D", "E"]))
            .await
            .unwrap();
        assert_eq!(out, "A\n\nB\n\nC\n\nD\n\nE");
        assert_eq!(echo.call_count(), 1);
    }

    #[tokio::test]
    async fn recursion_preserves_order_textually() {
        let echo = Arc::new(EchoCompressor::new());
        // Echo never shrinks, so the layer loop only converges once a
        // single lone unit remains; order must survive every layer.
        let r = reducer(echo.clone(), 4).with_units_per_group(2);
        let out = r.reduce("arc", units(&["A", "B", "C", "D", "E"])).await.unwrap();
        let pos = |c: char| out.find(c).unwrap();
        assert!(pos('A') < pos('B'));
        assert!(pos('B') < pos('C'));
        assert!(pos('C') < pos('D'));
        assert!(pos('D') < pos('E'));
    }

    #[tokio::test]
    async fn converges_with_a_shrinking_compressor() {
        let halving = Arc::new(HalvingCompressor::new());
        let texts: Vec<String> = (0..8).map(|_| "x".repeat(100)).collect();
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let r = reducer(halving.clone(), 200).with_units_per_group(2);
        let out = r.reduce("arc", units(&refs)).await.unwrap();
        assert!(!out.is_empty());
        // 8 units, group size 2: at most ceil(log2(8)) = 3 grouping
        // layers plus the final call.
        assert!(halving.call_count() <= 4 + 2 + 1 + 1);
    }

    #[tokio::test]
    async fn lone_oversized_unit_is_sent_alone() {
        let echo = Arc::new(EchoCompressor::new());
        let r = reducer(echo.clone(), 4).with_units_per_group(2);
        let big = "y".repeat(50);
        let out = r.reduce("arc", units(&[big.as_str()])).await.unwrap();
        assert_eq!(out, big);
        assert_eq!(echo.call_count(), 1);
    }

    #[tokio::test]
    async fn budget_respected_for_every_call() {
        let halving = Arc::new(HalvingCompressor::new());
        let texts: Vec<String> = (0..8).map(|_| "x".repeat(100)).collect();
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let r = reducer(halving.clone(), 300).with_units_per_group(2);
        let _ = r.reduce("arc", units(&refs)).await.unwrap();

        let estimator = CharsPerTokenEstimator::new(1);
        for prompt in halving.prompts() {
            let payload = abridge_llm::prompt::prompt_payload(&prompt);
            assert!(
                estimator.estimate(payload) <= 300,
                "call exceeded the input budget: {} chars",
                payload.len()
            );
        }
    }

    #[tokio::test]
    async fn three_units_within_group_size_take_one_extra_layer() {
        let echo = Arc::new(EchoCompressor::new());
        // Merged text of 3 one-char units is 7 chars; budget 6 forces one
        // grouping layer that merges all 3 into a single group.
        let r = reducer(echo.clone(), 6).with_units_per_group(10);
        let out = r.reduce("arc", units(&["a", "b", "c"])).await.unwrap();
        assert_eq!(out, "a\n\nb\n\nc");
        // The single group's output is already the complete condensation;
        // no further call happens.
        assert_eq!(echo.call_count(), 1);
    }
}
