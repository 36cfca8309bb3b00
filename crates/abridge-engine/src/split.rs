use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::warn;

use abridge_core::budget::Budget;
use abridge_core::estimator::TokenEstimator;
use abridge_core::unit::Unit;

/// How a stage's final output was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStrategy {
    /// One compressor call produced one output file.
    Single,
    /// The predicted output exceeded the output budget, so the input was
    /// split into independent chunks before compression.
    OutputSplit,
}

/// Ordered record of a stage's final output files. Downstream readers
/// iterate `parts` in order; concatenating them with the unit delimiter
/// reproduces the combined convenience file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub kind: String,
    pub parts: Vec<String>,
    pub generation_strategy: GenerationStrategy,
    pub budgets: ManifestBudgets,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManifestBudgets {
    pub max_input_tokens: usize,
    pub max_output_tokens: Option<usize>,
    pub expected_compression_ratio: f64,
}

impl ManifestBudgets {
    pub fn from_budget(budget: &Budget) -> Self {
        Self {
            max_input_tokens: budget.max_input_tokens,
            max_output_tokens: budget.max_output_tokens,
            expected_compression_ratio: budget.expected_compression_ratio,
        }
    }
}

/// Greedily pack contiguous units into chunks whose summed input
/// estimate stays under `input_ceiling`. A single unit over the ceiling
/// becomes its own chunk; truncation risk for that chunk remains, which
/// the engine can only log, not fix.
pub fn plan_chunks(
    units: &[Unit],
    estimator: &dyn TokenEstimator,
    input_ceiling: usize,
) -> Vec<Range<usize>> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut accumulated = 0usize;

    for (i, unit) in units.iter().enumerate() {
        let estimate = estimator.estimate(&unit.text);
        if start < i && accumulated + estimate > input_ceiling {
            chunks.push(start..i);
            start = i;
            accumulated = 0;
        }
        // An oversized unit always begins a chunk here: either it was
        // first, or the flush above just closed the previous one.
        if estimate > input_ceiling {
            warn!(
                unit = unit.id.as_str(),
                estimate,
                ceiling = input_ceiling,
                "unit exceeds the chunk ceiling, emitting it as its own part"
            );
            chunks.push(i..i + 1);
            start = i + 1;
            accumulated = 0;
            continue;
        }
        accumulated += estimate;
    }
    if start < units.len() {
        chunks.push(start..units.len());
    }
    chunks
}
