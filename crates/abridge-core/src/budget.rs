use serde::{Deserialize, Serialize};

/// Conservative default input ceiling. Most providers offer 128k+ context;
/// this leaves room for the condensation prompt and the response.
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 60_000;

/// Default count of units merged per intermediate reduction call.
pub const DEFAULT_UNITS_PER_GROUP: usize = 10;

/// Empirical guess for output/input token ratio of one condensation call.
///
/// Deliberately above the typically observed arc-level band so the
/// back-solved chunk ceiling errs small. This is a heuristic safety
/// margin, not a guarantee: if a call compresses less than assumed, the
/// provider may still truncate and nothing here can detect that after the
/// fact.
pub const DEFAULT_COMPRESSION_RATIO: f64 = 0.5;

/// Token-budget ceilings for a single compressor call.
///
/// `max_input_tokens` bounds what may be sent in one call.
/// `max_output_tokens`, when set, bounds what one call may be trusted to
/// return without truncation risk; it is enforced by pre-splitting the
/// input, never by inspecting output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Budget {
    pub max_input_tokens: usize,
    pub max_output_tokens: Option<usize>,
    pub expected_compression_ratio: f64,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_input_tokens: DEFAULT_MAX_INPUT_TOKENS,
            max_output_tokens: None,
            expected_compression_ratio: DEFAULT_COMPRESSION_RATIO,
        }
    }
}

impl Budget {
    /// Back-solve the largest input that should keep one call's output
    /// under the output ceiling, given the assumed compression ratio.
    /// `None` when no output budget is configured.
    pub fn chunk_input_ceiling(&self) -> Option<usize> {
        let max_out = self.max_output_tokens?;
        let ratio = self.expected_compression_ratio.max(f64::EPSILON);
        Some(((max_out as f64) / ratio).floor() as usize)
    }

    /// Predicted output size for an input of `input_tokens`.
    pub fn predicted_output_tokens(&self, input_tokens: usize) -> usize {
        (input_tokens as f64 * self.expected_compression_ratio).ceil() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_output_budget_means_no_ceiling() {
        assert_eq!(Budget::default().chunk_input_ceiling(), None);
    }

    #[test]
    fn ceiling_back_solves_ratio() {
        let budget = Budget {
            max_input_tokens: 60_000,
            max_output_tokens: Some(8_000),
            expected_compression_ratio: 0.5,
        };
        assert_eq!(budget.chunk_input_ceiling(), Some(16_000));
    }

    #[test]
    fn predicted_output_rounds_up() {
        let budget = Budget {
            expected_compression_ratio: 0.3,
            ..Default::default()
        };
        assert_eq!(budget.predicted_output_tokens(10), 3);
        assert_eq!(budget.predicted_output_tokens(1), 1);
        assert_eq!(budget.predicted_output_tokens(0), 0);
    }

    #[test]
    fn serde_roundtrip() {
        let budget = Budget {
            max_input_tokens: 1000,
            max_output_tokens: Some(400),
            expected_compression_ratio: 0.4,
        };
        let json = serde_json::to_string(&budget).unwrap();
        let parsed: Budget = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.max_input_tokens, 1000);
        assert_eq!(parsed.max_output_tokens, Some(400));
    }
}
