use std::path::Path;

use abridge_core::compressor::TokenUsage;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::RunId;

// Per-million-token pricing in USD. Models absent from the table get a
// None cost rather than a guess, so totals stay honest.
const MODEL_PRICING: &[(&str, f64, f64)] = &[
    ("gpt-4o", 2.50, 10.00),
    ("gpt-4o-mini", 0.15, 0.60),
    ("gemini-2.5-flash", 0.075, 0.30),
    ("gemini-1.5-pro", 1.25, 5.00),
    ("deepseek-chat", 0.14, 0.28),
    // Local models run free.
    ("llama3", 0.0, 0.0),
    ("qwen2.5:7b", 0.0, 0.0),
    ("qwen2.5:14b", 0.0, 0.0),
];

/// Estimate the USD cost of one call, or None when the model has no
/// pricing entry.
pub fn estimate_cost(model: &str, input_tokens: u64, output_tokens: u64) -> Option<f64> {
    let (_, input_price, output_price) = MODEL_PRICING
        .iter()
        .find(|(name, _, _)| *name == model)?;
    Some((input_tokens as f64 * input_price + output_tokens as f64 * output_price) / 1_000_000.0)
}

/// Totals for one run's LLM usage.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UsageSummary {
    pub call_count: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    /// None when pricing was unavailable for any recorded model.
    pub total_cost_usd: Option<f64>,
}

impl UsageSummary {
    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens + self.total_output_tokens
    }
}

/// Append-only SQLite sink for per-call token usage and estimated cost.
pub struct CostSink {
    conn: Mutex<Connection>,
}

impl CostSink {
    pub fn open(db_path: &Path) -> Result<Self, rusqlite::Error> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             CREATE TABLE IF NOT EXISTS llm_usage_events (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 run_id TEXT NOT NULL,
                 stage TEXT NOT NULL,
                 unit_id TEXT NOT NULL,
                 model TEXT NOT NULL,
                 input_tokens INTEGER NOT NULL,
                 output_tokens INTEGER NOT NULL,
                 estimated_cost REAL,
                 created_at TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_llm_usage_events_run_id
                 ON llm_usage_events(run_id);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Record one call's usage. Missing token counts are stored as zero.
    /// Never fails.
    pub fn record(
        &self,
        run_id: &RunId,
        stage: &str,
        unit_id: &str,
        model: &str,
        usage: &TokenUsage,
    ) {
        let input_tokens = u64::from(usage.input_tokens.unwrap_or(0));
        let output_tokens = u64::from(usage.output_tokens.unwrap_or(0));
        let cost = estimate_cost(model, input_tokens, output_tokens);

        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO llm_usage_events
                 (run_id, stage, unit_id, model, input_tokens, output_tokens, estimated_cost, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                run_id.as_str(),
                stage,
                unit_id,
                model,
                input_tokens as i64,
                output_tokens as i64,
                cost,
                Utc::now().to_rfc3339(),
            ],
        );
        if let Err(e) = result {
            warn!(error = %e, "usage event insert failed (non-blocking)");
        }
    }

    pub fn summary(&self, run_id: &RunId) -> Result<UsageSummary, rusqlite::Error> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(input_tokens), 0),
                    COALESCE(SUM(output_tokens), 0),
                    SUM(estimated_cost)
             FROM llm_usage_events
             WHERE run_id = ?1",
            [run_id.as_str()],
            |row| {
                Ok(UsageSummary {
                    call_count: row.get::<_, i64>(0)? as u64,
                    total_input_tokens: row.get::<_, i64>(1)? as u64,
                    total_output_tokens: row.get::<_, i64>(2)? as u64,
                    total_cost_usd: row.get::<_, Option<f64>>(3)?,
                })
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_db() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("abridge-cost-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("telemetry.db")
    }

    fn usage(input: u32, output: u32) -> TokenUsage {
        TokenUsage {
            input_tokens: Some(input),
            output_tokens: Some(output),
        }
    }

    #[test]
    fn known_model_cost() {
        let cost = estimate_cost("deepseek-chat", 1_000_000, 1_000_000).unwrap();
        assert!((cost - 0.42).abs() < 1e-9);
    }

    #[test]
    fn unknown_model_has_no_cost() {
        assert!(estimate_cost("mystery-model", 1000, 1000).is_none());
    }

    #[test]
    fn local_model_is_free() {
        assert_eq!(estimate_cost("qwen2.5:7b", 500_000, 250_000), Some(0.0));
    }

    #[test]
    fn record_and_summarize() {
        let sink = CostSink::open(&temp_db()).unwrap();
        let run = RunId::new();
        sink.record(&run, "chapter", "chapter_001", "deepseek-chat", &usage(1000, 500));
        sink.record(&run, "chapter", "chapter_002", "deepseek-chat", &usage(2000, 800));

        let summary = sink.summary(&run).unwrap();
        assert_eq!(summary.call_count, 2);
        assert_eq!(summary.total_input_tokens, 3000);
        assert_eq!(summary.total_output_tokens, 1300);
        assert_eq!(summary.total_tokens(), 4300);
        assert!(summary.total_cost_usd.is_some());
    }

    #[test]
    fn missing_usage_counts_as_zero() {
        let sink = CostSink::open(&temp_db()).unwrap();
        let run = RunId::new();
        sink.record(&run, "arc", "arc_01", "qwen2.5:7b", &TokenUsage::default());

        let summary = sink.summary(&run).unwrap();
        assert_eq!(summary.call_count, 1);
        assert_eq!(summary.total_tokens(), 0);
    }

    #[test]
    fn empty_run_summary() {
        let sink = CostSink::open(&temp_db()).unwrap();
        let summary = sink.summary(&RunId::new()).unwrap();
        assert_eq!(summary.call_count, 0);
        assert!(summary.total_cost_usd.is_none());
    }
}
