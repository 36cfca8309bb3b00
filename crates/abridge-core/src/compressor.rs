use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::CompressError;

/// Token usage reported by a provider for one call, when available.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
}

/// Result of one compression call.
///
/// Every provider returns this shape; `usage` is simply `None` when the
/// backend reports nothing. There is no second, "richer" call to probe for.
#[derive(Clone, Debug)]
pub struct Compression {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

impl Compression {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

/// The external text-shortening capability the engine treats as opaque.
///
/// Implementations do not retry; transient failures surface as
/// `CompressError` and the calling layer decides whether to re-attempt.
#[async_trait]
pub trait Compressor: Send + Sync {
    /// Provider name for logging ("ollama", "openai", "mock").
    fn name(&self) -> &str;

    /// Model identifier for usage accounting.
    fn model(&self) -> &str;

    /// Send one prompt, receive compressed text.
    async fn compress(&self, prompt: &str) -> Result<Compression, CompressError>;
}
