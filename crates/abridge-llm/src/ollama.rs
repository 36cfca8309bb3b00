use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use abridge_core::compressor::{Compression, Compressor, TokenUsage};
use abridge_core::errors::CompressError;

use crate::extract::extract_answer;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Local inference via Ollama's non-streaming `/api/generate` endpoint.
///
/// Intended for the chapter stage's volume of calls, where a local 7B-9B
/// model keeps the run free. Token counts come back as
/// `prompt_eval_count` / `eval_count` when the server reports them.
pub struct OllamaCompressor {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl OllamaCompressor {
    pub fn new(
        base_url: Option<String>,
        model: String,
        temperature: f64,
        max_tokens: u32,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model,
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl Compressor for OllamaCompressor {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn compress(&self, prompt: &str) -> Result<Compression, CompressError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompressError::Timeout(REQUEST_TIMEOUT)
                } else {
                    CompressError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompressError::from_status(status.as_u16(), body));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CompressError::Network(format!("malformed response body: {e}")))?;

        if body.response.is_empty() {
            return Err(CompressError::EmptyResponse);
        }

        let text = extract_answer(&body.response);
        if text.is_empty() {
            return Err(CompressError::EmptyResponse);
        }

        Ok(Compression {
            text,
            usage: Some(TokenUsage {
                input_tokens: body.prompt_eval_count,
                output_tokens: body.eval_count,
            }),
        })
    }
}
