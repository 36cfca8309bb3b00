use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the lexical analysis subsystem.
///
/// Individual analysis features are non-blocking relative to each other, so
/// most of these surface as per-feature warnings rather than aborting a run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no chapter data found for novel; checked {raw:?} and {condensed:?}")]
    NoSource { raw: PathBuf, condensed: PathBuf },

    #[error("preferred chapter source is not available: {0}")]
    SourceUnavailable(PathBuf),

    #[error("no chapter files found in {0}")]
    NoChapters(PathBuf),

    #[error("no {feature} artifact found for novel '{novel}'")]
    MissingArtifact { feature: String, novel: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
