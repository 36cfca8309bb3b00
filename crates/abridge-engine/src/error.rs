use std::path::PathBuf;

use abridge_core::errors::CompressError;
use abridge_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("cannot condense an empty unit sequence")]
    EmptyInput,

    #[error("corpus directory not found: {0}")]
    CorpusNotFound(PathBuf),

    #[error("no unit files found in: {0}")]
    NoUnits(PathBuf),

    #[error(
        "cannot skip {stage} stage: {reason}. \
         Remove the skip flag to regenerate, or repair the outputs manually"
    )]
    SkipValidation { stage: String, reason: String },

    #[error("{stage} stage needs {expected} upstream units but found {found}")]
    IncompleteUpstream {
        stage: String,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Compress(#[from] CompressError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_validation_message_names_the_stage() {
        let err = EngineError::SkipValidation {
            stage: "chapter".into(),
            reason: "3 raw chapters, 2 condensed".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("chapter"));
        assert!(msg.contains("Remove the skip flag"));
    }

    #[test]
    fn compress_errors_convert() {
        let err: EngineError = CompressError::EmptyResponse.into();
        assert!(matches!(err, EngineError::Compress(_)));
    }
}
