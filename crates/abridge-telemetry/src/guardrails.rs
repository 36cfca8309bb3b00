use std::path::Path;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::RunId;

// Compression ratio thresholds (output_length / input_length).
// Conservative defaults; tunable from observed data without touching
// pipeline logic.
//
// Chapter depth condenses raw prose; deeper layers condense
// already-condensed text and are expected to compress harder.
const CHAPTER_GREEN_MIN: f64 = 0.40;
const CHAPTER_GREEN_MAX: f64 = 0.70;
const CHAPTER_YELLOW_MIN: f64 = 0.30;
const CHAPTER_YELLOW_MAX: f64 = 0.85;

const ARC_GREEN_MIN: f64 = 0.25;
const ARC_GREEN_MAX: f64 = 0.50;
const ARC_YELLOW_MIN: f64 = 0.15;
const ARC_YELLOW_MAX: f64 = 0.65;

/// Health classification of one condensation's length ratio.
///
/// Classification only — nothing acts on it. Over-condensation (low
/// ratio) hints at narrative loss; under-condensation (high ratio) hints
/// at a model that stopped compressing. Both fail silently without
/// measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioStatus {
    Green,
    Yellow,
    Red,
}

impl RatioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

fn thresholds_for_stage(stage: &str) -> (f64, f64, f64, f64) {
    if stage.to_ascii_lowercase().starts_with("chapter") {
        (
            CHAPTER_GREEN_MIN,
            CHAPTER_GREEN_MAX,
            CHAPTER_YELLOW_MIN,
            CHAPTER_YELLOW_MAX,
        )
    } else {
        (ARC_GREEN_MIN, ARC_GREEN_MAX, ARC_YELLOW_MIN, ARC_YELLOW_MAX)
    }
}

/// Classify a ratio against the stage's threshold bands.
pub fn classify_ratio(ratio: f64, stage: &str) -> RatioStatus {
    let (green_min, green_max, yellow_min, yellow_max) = thresholds_for_stage(stage);

    if (green_min..=green_max).contains(&ratio) {
        return RatioStatus::Green;
    }
    if (yellow_min..green_min).contains(&ratio) || (ratio > green_max && ratio <= yellow_max) {
        return RatioStatus::Yellow;
    }
    RatioStatus::Red
}

/// Per-run status counts.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RatioSummary {
    pub total: u64,
    pub green: u64,
    pub yellow: u64,
    pub red: u64,
}

/// Append-only SQLite sink for condensation ratio events.
///
/// Every write path here swallows its own errors: instrumentation must
/// never halt or alter the pipeline.
pub struct GuardrailSink {
    conn: Mutex<Connection>,
}

impl GuardrailSink {
    pub fn open(db_path: &Path) -> Result<Self, rusqlite::Error> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             CREATE TABLE IF NOT EXISTS guardrail_events (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 run_id TEXT NOT NULL,
                 stage TEXT NOT NULL,
                 unit_id TEXT NOT NULL,
                 input_length INTEGER NOT NULL,
                 output_length INTEGER NOT NULL,
                 ratio REAL NOT NULL,
                 status TEXT NOT NULL,
                 created_at TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_guardrail_events_run_id
                 ON guardrail_events(run_id);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Record one condensation measurement. Never fails.
    pub fn record(
        &self,
        run_id: &RunId,
        stage: &str,
        unit_id: &str,
        input_length: usize,
        output_length: usize,
    ) -> RatioStatus {
        let ratio = if input_length == 0 {
            0.0
        } else {
            output_length as f64 / input_length as f64
        };
        let status = classify_ratio(ratio, stage);

        if status != RatioStatus::Green {
            warn!(
                stage = stage,
                unit = unit_id,
                ratio = format!("{ratio:.3}").as_str(),
                status = status.as_str(),
                "condensation ratio outside green band"
            );
        }

        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO guardrail_events
                 (run_id, stage, unit_id, input_length, output_length, ratio, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                run_id.as_str(),
                stage,
                unit_id,
                input_length as i64,
                output_length as i64,
                ratio,
                status.as_str(),
                Utc::now().to_rfc3339(),
            ],
        );
        if let Err(e) = result {
            warn!(error = %e, "guardrail event insert failed (non-blocking)");
        }
        status
    }

    /// Status counts for a run.
    pub fn summary(&self, run_id: &RunId) -> Result<RatioSummary, rusqlite::Error> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT status, COUNT(*) FROM guardrail_events WHERE run_id = ?1 GROUP BY status",
        )?;
        let mut summary = RatioSummary::default();
        let rows = stmt.query_map([run_id.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (status, count) = row?;
            let count = count as u64;
            match status.as_str() {
                "green" => summary.green = count,
                "yellow" => summary.yellow = count,
                "red" => summary.red = count,
                _ => {}
            }
        }
        summary.total = summary.green + summary.yellow + summary.red;
        Ok(summary)
    }
}
