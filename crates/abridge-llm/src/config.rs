use std::str::FromStr;
use std::sync::Arc;

use secrecy::SecretString;

use abridge_core::compressor::Compressor;
use abridge_core::errors::CompressError;

use crate::ollama::OllamaCompressor;
use crate::openai::OpenAiCompatCompressor;
use crate::reliable::{ReliableCompressor, RetryConfig};

const DEFAULT_TEMPERATURE: f64 = 0.3;
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Compressor backend selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    OpenAiCompat,
}

impl FromStr for Provider {
    type Err = CompressError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAiCompat),
            other => Err(CompressError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Provider configuration, resolved once at process startup and threaded
/// through as a value. No global singleton, no import-time construction.
#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: Provider,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub retry: RetryConfig,
}

impl LlmConfig {
    /// Read configuration from `ABRIDGE_*` environment variables.
    ///
    /// - `ABRIDGE_LLM_PROVIDER`: "ollama" (default) or "openai"
    /// - `ABRIDGE_LLM_MODEL`: model identifier
    /// - `ABRIDGE_LLM_BASE_URL`: server URL (required for openai)
    /// - `ABRIDGE_LLM_API_KEY`: bearer token, if the server needs one
    pub fn from_env() -> Result<Self, CompressError> {
        let provider: Provider = std::env::var("ABRIDGE_LLM_PROVIDER")
            .unwrap_or_else(|_| "ollama".to_string())
            .parse()?;

        let model = std::env::var("ABRIDGE_LLM_MODEL").unwrap_or_else(|_| match provider {
            Provider::Ollama => "qwen2.5:7b".to_string(),
            Provider::OpenAiCompat => "deepseek-chat".to_string(),
        });

        Ok(Self {
            provider,
            model,
            base_url: std::env::var("ABRIDGE_LLM_BASE_URL").ok(),
            api_key: std::env::var("ABRIDGE_LLM_API_KEY").ok().map(Into::into),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            retry: RetryConfig::default(),
        })
    }
}

/// Build the configured compressor, wrapped with the retry policy.
///
/// The engine receives this as an explicit capability; provider selection
/// happens exactly once, here.
pub fn create_compressor(config: &LlmConfig) -> Result<Arc<dyn Compressor>, CompressError> {
    match config.provider {
        Provider::Ollama => {
            let inner = OllamaCompressor::new(
                config.base_url.clone(),
                config.model.clone(),
                config.temperature,
                config.max_tokens,
            );
            Ok(Arc::new(ReliableCompressor::new(
                inner,
                config.retry.clone(),
            )))
        }
        Provider::OpenAiCompat => {
            let base_url = config.base_url.clone().ok_or_else(|| {
                CompressError::InvalidRequest(
                    "ABRIDGE_LLM_BASE_URL is required for the openai provider".into(),
                )
            })?;
            let inner = OpenAiCompatCompressor::new(
                base_url,
                config.api_key.clone(),
                config.model.clone(),
                config.temperature,
                config.max_tokens,
            );
            Ok(Arc::new(ReliableCompressor::new(
                inner,
                config.retry.clone(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_case_insensitive() {
        assert_eq!("ollama".parse::<Provider>().unwrap(), Provider::Ollama);
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAiCompat);
    }

    #[test]
    fn unknown_provider_is_fatal_config_error() {
        let err = "tarot".parse::<Provider>().unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, CompressError::UnsupportedProvider(_)));
    }

    #[test]
    fn openai_without_base_url_rejected() {
        let config = LlmConfig {
            provider: Provider::OpenAiCompat,
            model: "deepseek-chat".into(),
            base_url: None,
            api_key: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            retry: RetryConfig::default(),
        };
        assert!(create_compressor(&config).is_err());
    }

    #[test]
    fn ollama_builds_without_base_url() {
        let config = LlmConfig {
            provider: Provider::Ollama,
            model: "qwen2.5:7b".into(),
            base_url: None,
            api_key: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            retry: RetryConfig::default(),
        };
        let compressor = create_compressor(&config).unwrap();
        assert_eq!(compressor.name(), "ollama");
        assert_eq!(compressor.model(), "qwen2.5:7b");
    }
}
