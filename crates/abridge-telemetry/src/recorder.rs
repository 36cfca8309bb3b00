use std::path::Path;

use abridge_core::compressor::TokenUsage;
use abridge_core::observer::CondenseObserver;
use tracing::{info, warn};

use crate::{CostSink, GuardrailSink, RatioSummary, RunId, UsageSummary};

/// Observer wired to the SQLite sinks. Both sinks share one database
/// file; a failure to open either leaves that sink disabled instead of
/// failing the run.
pub struct Recorder {
    run_id: RunId,
    guardrails: Option<GuardrailSink>,
    cost: Option<CostSink>,
}

impl Recorder {
    pub fn open(db_path: &Path) -> Self {
        let guardrails = match GuardrailSink::open(db_path) {
            Ok(sink) => Some(sink),
            Err(e) => {
                warn!(error = %e, "guardrail sink unavailable, ratios will not be persisted");
                None
            }
        };
        let cost = match CostSink::open(db_path) {
            Ok(sink) => Some(sink),
            Err(e) => {
                warn!(error = %e, "cost sink unavailable, usage will not be persisted");
                None
            }
        };
        Self {
            run_id: RunId::new(),
            guardrails,
            cost,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn ratio_summary(&self) -> Option<RatioSummary> {
        self.guardrails.as_ref()?.summary(&self.run_id).ok()
    }

    pub fn usage_summary(&self) -> Option<UsageSummary> {
        self.cost.as_ref()?.summary(&self.run_id).ok()
    }

    /// Log end-of-run totals. Called from the pipeline's cleanup path,
    /// so it must not fail.
    pub fn log_summaries(&self) {
        if let Some(ratios) = self.ratio_summary() {
            info!(
                run = %self.run_id,
                total = ratios.total,
                green = ratios.green,
                yellow = ratios.yellow,
                red = ratios.red,
                "condensation ratio summary"
            );
        }
        if let Some(usage) = self.usage_summary() {
            match usage.total_cost_usd {
                Some(cost) => info!(
                    run = %self.run_id,
                    calls = usage.call_count,
                    input_tokens = usage.total_input_tokens,
                    output_tokens = usage.total_output_tokens,
                    cost_usd = format!("{cost:.4}").as_str(),
                    "llm usage summary"
                ),
                None => info!(
                    run = %self.run_id,
                    calls = usage.call_count,
                    input_tokens = usage.total_input_tokens,
                    output_tokens = usage.total_output_tokens,
                    "llm usage summary (no pricing for recorded models)"
                ),
            }
        }
    }
}

impl CondenseObserver for Recorder {
    fn record_ratio(&self, stage: &str, unit_id: &str, input_len: usize, output_len: usize) {
        if let Some(sink) = &self.guardrails {
            sink.record(&self.run_id, stage, unit_id, input_len, output_len);
        }
    }

    fn record_usage(&self, stage: &str, unit_id: &str, model: &str, usage: &TokenUsage) {
        if let Some(sink) = &self.cost {
            sink.record(&self.run_id, stage, unit_id, model, usage);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_db() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("abridge-recorder-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("telemetry.db")
    }

    #[test]
    fn records_through_both_sinks() {
        let recorder = Recorder::open(&temp_db());
        recorder.record_ratio("chapter", "chapter_001", 100, 50);
        recorder.record_usage(
            "chapter",
            "chapter_001",
            "deepseek-chat",
            &TokenUsage {
                input_tokens: Some(100),
                output_tokens: Some(50),
            },
        );

        let ratios = recorder.ratio_summary().unwrap();
        assert_eq!(ratios.total, 1);
        assert_eq!(ratios.green, 1);

        let usage = recorder.usage_summary().unwrap();
        assert_eq!(usage.call_count, 1);
        assert_eq!(usage.total_tokens(), 150);
    }

    #[test]
    fn each_recorder_gets_a_fresh_run() {
        let path = temp_db();
        let a = Recorder::open(&path);
        let b = Recorder::open(&path);
        a.record_ratio("chapter", "chapter_001", 100, 50);
        assert_eq!(b.ratio_summary().unwrap().total, 0);
    }
}
