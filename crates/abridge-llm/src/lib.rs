pub mod config;
pub mod extract;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod prompt;
pub mod reliable;

pub use config::{create_compressor, LlmConfig, Provider};
pub use mock::{EchoCompressor, HalvingCompressor, MockCompressor, MockResponse};
pub use ollama::OllamaCompressor;
pub use prompt::{condensation_prompt, prompt_payload};
pub use openai::OpenAiCompatCompressor;
pub use reliable::{ReliableCompressor, RetryConfig};
