use crate::compressor::TokenUsage;

/// Side-effecting instrumentation hooks called around every compression.
///
/// Methods are infallible by signature: implementations must catch and
/// swallow their own failures. Nothing recorded here may influence control
/// flow — these are advisory sinks, not guardrails in the blocking sense.
pub trait CondenseObserver: Send + Sync {
    /// Record one condensation's input/output lengths (characters).
    fn record_ratio(&self, stage: &str, unit_id: &str, input_len: usize, output_len: usize);

    /// Record one provider call's token usage, when reported.
    fn record_usage(&self, stage: &str, unit_id: &str, model: &str, usage: &TokenUsage);
}

/// Observer that records nothing. Used by tests and by callers that opt
/// out of instrumentation.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl CondenseObserver for NullObserver {
    fn record_ratio(&self, _stage: &str, _unit_id: &str, _input_len: usize, _output_len: usize) {}

    fn record_usage(&self, _stage: &str, _unit_id: &str, _model: &str, _usage: &TokenUsage) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_observer_is_inert() {
        let obs = NullObserver;
        obs.record_ratio("chapter", "chapter_001", 100, 50);
        obs.record_usage("chapter", "chapter_001", "mock-model", &TokenUsage::default());
    }
}
