use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use abridge_core::compressor::{Compression, Compressor, TokenUsage};
use abridge_core::errors::CompressError;

use crate::prompt::prompt_payload;

/// Pre-programmed outcome for one `compress` call.
pub enum MockResponse {
    Text(String),
    Error(CompressError),
}

impl MockResponse {
    pub fn text(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Compressor that returns scripted responses in sequence, for
/// deterministic tests without any network.
pub struct MockCompressor {
    responses: Mutex<VecDeque<MockResponse>>,
    call_count: AtomicUsize,
}

impl MockCompressor {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Compressor for MockCompressor {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn compress(&self, _prompt: &str) -> Result<Compression, CompressError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        let next = self.responses.lock().pop_front();
        match next {
            Some(MockResponse::Text(text)) => Ok(Compression {
                text,
                usage: Some(TokenUsage {
                    input_tokens: Some(100),
                    output_tokens: Some(50),
                }),
            }),
            Some(MockResponse::Error(e)) => Err(e),
            None => Err(CompressError::InvalidRequest(
                "MockCompressor: no response configured for this call".into(),
            )),
        }
    }
}

/// Compressor that returns the prompt's payload untouched. Lets tests
/// assert exactly what text the engine sent and in what order.
#[derive(Default)]
pub struct EchoCompressor {
    call_count: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl EchoCompressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Compressor for EchoCompressor {
    fn name(&self) -> &str {
        "echo"
    }

    fn model(&self) -> &str {
        "echo-model"
    }

    async fn compress(&self, prompt: &str) -> Result<Compression, CompressError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.prompts.lock().push(prompt.to_string());
        Ok(Compression::text_only(prompt_payload(prompt)))
    }
}

/// Compressor that strictly shortens the payload by keeping the first
/// half (by characters). Gives reduction tests guaranteed convergence.
#[derive(Default)]
pub struct HalvingCompressor {
    call_count: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl HalvingCompressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Compressor for HalvingCompressor {
    fn name(&self) -> &str {
        "halving"
    }

    fn model(&self) -> &str {
        "halving-model"
    }

    async fn compress(&self, prompt: &str) -> Result<Compression, CompressError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.prompts.lock().push(prompt.to_string());
        let chars: Vec<char> = prompt_payload(prompt).chars().collect();
        let keep = (chars.len() / 2).max(1);
        Ok(Compression::text_only(
            chars[..keep].iter().collect::<String>(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_returns_scripted_sequence() {
        let mock = MockCompressor::new(vec![
            MockResponse::text("first"),
            MockResponse::text("second"),
        ]);
        assert_eq!(mock.compress("a").await.unwrap().text, "first");
        assert_eq!(mock.compress("b").await.unwrap().text, "second");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn mock_exhausted_script_errors() {
        let mock = MockCompressor::new(vec![]);
        let err = mock.compress("a").await.unwrap_err();
        assert!(matches!(err, CompressError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn mock_scripted_error_surfaces() {
        let mock = MockCompressor::new(vec![MockResponse::Error(CompressError::EmptyResponse)]);
        assert!(matches!(
            mock.compress("a").await,
            Err(CompressError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn echo_preserves_input_and_records_prompts() {
        let echo = EchoCompressor::new();
        let out = echo.compress("A\n\nB").await.unwrap();
        assert_eq!(out.text, "A\n\nB");
        assert_eq!(echo.prompts(), vec!["A\n\nB".to_string()]);
    }

    #[tokio::test]
    async fn echo_unwraps_the_condensation_prompt() {
        let echo = EchoCompressor::new();
        let prompt = crate::prompt::condensation_prompt("A\n\nB");
        assert_eq!(echo.compress(&prompt).await.unwrap().text, "A\n\nB");
    }

    #[tokio::test]
    async fn halving_strictly_shortens() {
        let halving = HalvingCompressor::new();
        let out = halving.compress("abcdefgh").await.unwrap();
        assert_eq!(out.text, "abcd");
        // Never empties.
        let out = halving.compress("x").await.unwrap();
        assert_eq!(out.text, "x");
    }
}
