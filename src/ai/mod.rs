//! AI integration module.
//!
//! Turns extracted specification content into structured cards using a
//! generative language model.
//!
//! ## Features
//!
//! - Duplicate-aware prompt construction from prior tracker items
//! - Strict parsing of the model's JSON output into [`Card`](crate::core::Card)s
//! - Bounded retries with exponential backoff on provider throttling

mod gemini;
mod prompt;
mod synthesizer;

pub use gemini::GeminiProvider;
pub use prompt::{build_prompt, FUTURE_WORK_HEADINGS};
pub use synthesizer::{parse_cards, strip_code_fences, Synthesis, SynthesisError, Synthesizer};

use async_trait::async_trait;

/// Trait for language model providers.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a text completion for a plain-text prompt.
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;

    /// List the models available to the configured credentials.
    async fn list_models(&self) -> Result<Vec<String>, ModelError>;

    /// Get the model name.
    fn name(&self) -> &str;
}

/// AI error types.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited or quota exhausted")]
    RateLimited,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("No response from model")]
    EmptyResponse,
}

impl ModelError {
    /// Whether the error signals throttling.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}
