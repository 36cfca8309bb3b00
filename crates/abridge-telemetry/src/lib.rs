mod cost;
mod guardrails;
mod recorder;

pub use cost::{CostSink, UsageSummary};
pub use guardrails::{GuardrailSink, RatioStatus, RatioSummary};
pub use recorder::Recorder;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for one pipeline execution. All guardrail and usage
/// events carry it, so partial runs remain inspectable after a crash.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new() -> Self {
        Self(format!("run_{}", uuid::Uuid::now_v7()))
    }

    pub fn from_raw(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Initialize logging. Call once at startup; `RUST_LOG` overrides the
/// "info" default.
pub fn init_telemetry() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_has_prefix_and_is_unique() {
        let a = RunId::new();
        let b = RunId::new();
        assert!(a.as_str().starts_with("run_"), "got: {a}");
        assert_ne!(a, b);
    }

    #[test]
    fn run_id_serde_is_transparent() {
        let id = RunId::from_raw("run_fixed");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"run_fixed\"");
    }
}
