use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use abridge_core::compressor::{Compression, Compressor, TokenUsage};
use abridge_core::errors::CompressError;

use crate::extract::extract_answer;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Provider speaking the OpenAI `/v1/chat/completions` wire format.
///
/// One implementation covers the whole OpenAI-compatible family
/// (DeepSeek, Groq, Cerebras, vLLM, OpenRouter) — only the base URL, key,
/// and model differ.
pub struct OpenAiCompatCompressor {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
}

impl OpenAiCompatCompressor {
    pub fn new(
        base_url: String,
        api_key: Option<SecretString>,
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
            base_url,
            api_key,
            model,
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl Compressor for OpenAiCompatCompressor {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn compress(&self, prompt: &str) -> Result<Compression, CompressError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
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

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompressError::Network(format!("malformed response body: {e}")))?;

        let raw = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or_default();
        if raw.is_empty() {
            return Err(CompressError::EmptyResponse);
        }

        let text = extract_answer(raw);
        if text.is_empty() {
            return Err(CompressError::EmptyResponse);
        }

        Ok(Compression {
            text,
            usage: body.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_wire_shape() {
        let request = ChatRequest {
            model: "deepseek-chat",
            messages: vec![ChatMessage {
                role: "user",
                content: "condense this",
            }],
            temperature: 0.3,
            max_tokens: 8192,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "deepseek-chat");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 8192);
    }

    #[test]
    fn response_parses_usage_optional() {
        let with: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"out"}}],"usage":{"prompt_tokens":10,"completion_tokens":5}}"#,
        )
        .unwrap();
        assert_eq!(with.choices[0].message.content, "out");
        assert_eq!(with.usage.as_ref().unwrap().prompt_tokens, Some(10));

        let without: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"out"}}]}"#).unwrap();
        assert!(without.usage.is_none());
    }

    #[test]
    fn trailing_slash_in_base_url_tolerated() {
        let c = OpenAiCompatCompressor::new(
            "https://api.deepseek.com/".into(),
            None,
            "deepseek-chat".into(),
            0.3,
            8192,
        );
        assert_eq!(c.base_url, "https://api.deepseek.com/");
        // URL join strips the extra slash at request time.
        assert_eq!(
            format!("{}/v1/chat/completions", c.base_url.trim_end_matches('/')),
            "https://api.deepseek.com/v1/chat/completions"
        );
    }
}
