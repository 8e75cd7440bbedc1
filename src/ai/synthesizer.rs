//! Card synthesis from specification content.
//!
//! Sends the duplicate-aware prompt to the language model and validates the
//! JSON array it returns. Throttled calls are retried with exponential
//! backoff; every other failure surfaces immediately.

use std::time::Duration;

use serde_json::Value;

use super::{build_prompt, LanguageModel, ModelError};
use crate::core::{retry_async_if, Card, Category, PriorItem, RetryConfig};
use crate::document::DocumentContent;

/// Errors raised while synthesizing cards.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Model still rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Model '{model}' not found (available: {})", display_models(.available))]
    ModelNotFound { model: String, available: Vec<String> },

    #[error("Model provider error: {0}")]
    Provider(ModelError),
}

fn display_models(models: &[String]) -> String {
    if models.is_empty() {
        "unknown".to_string()
    } else {
        models.join(", ")
    }
}

/// Outcome of a successful synthesis.
#[derive(Debug, Clone)]
pub struct Synthesis {
    /// Cards in model order
    pub cards: Vec<Card>,

    /// Model calls made
    pub attempts: u32,

    /// Backoff delays slept between calls
    pub delays: Vec<Duration>,
}

/// Generates cards from document content with a language model.
pub struct Synthesizer {
    model: Box<dyn LanguageModel>,
    retry: RetryConfig,
}

impl Synthesizer {
    /// Create a synthesizer with the production retry policy.
    pub fn new(model: Box<dyn LanguageModel>) -> Self {
        Self { model, retry: RetryConfig::model() }
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Synthesize cards, returning them in model order.
    ///
    /// An empty vector is a valid outcome (nothing new to report).
    pub async fn synthesize(
        &self,
        content: &DocumentContent,
        prior_items: &[PriorItem],
    ) -> Result<Vec<Card>, SynthesisError> {
        self.synthesize_detailed(content, prior_items).await.map(|s| s.cards)
    }

    /// Synthesize cards and report the retry history.
    pub async fn synthesize_detailed(
        &self,
        content: &DocumentContent,
        prior_items: &[PriorItem],
    ) -> Result<Synthesis, SynthesisError> {
        let prompt = build_prompt(content, prior_items);
        tracing::info!(
            model = self.model.name(),
            prompt_chars = prompt.chars().count(),
            prior_items = prior_items.len(),
            "Requesting cards from model"
        );

        let outcome = retry_async_if(
            &self.retry,
            || self.model.generate(&prompt),
            ModelError::is_rate_limited,
        )
        .await;

        let attempts = outcome.attempts;
        let delays = outcome.delays;

        match outcome.result {
            Ok(text) => {
                let cards = parse_cards(&text).inspect_err(|_| {
                    tracing::error!(response = %preview(&text), "Could not decode model response");
                })?;
                tracing::info!(cards = cards.len(), attempts, "Model returned cards");
                Ok(Synthesis { cards, attempts, delays })
            }
            Err(ModelError::RateLimited) => {
                tracing::error!(attempts, "Rate limit persisted, giving up");
                Err(SynthesisError::RateLimited { attempts })
            }
            Err(ModelError::ModelNotFound(model)) => {
                let available = match self.model.list_models().await {
                    Ok(models) => models,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to list available models");
                        Vec::new()
                    }
                };
                tracing::error!(model = %model, available = ?available, "Model not found");
                Err(SynthesisError::ModelNotFound { model, available })
            }
            Err(e) => Err(SynthesisError::Provider(e)),
        }
    }
}

/// First 500 characters of a response, for diagnostics.
fn preview(text: &str) -> String {
    text.chars().take(500).collect()
}

/// Remove a surrounding Markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parse the model's response into cards.
///
/// The response must be a JSON array of objects with `title`, `description`
/// and `type`; `acceptance_criteria` defaults to empty. `parent_index`
/// values that are not numeric, or that do not point to an earlier card,
/// become `None`.
pub fn parse_cards(response: &str) -> Result<Vec<Card>, SynthesisError> {
    let value: Value = serde_json::from_str(strip_code_fences(response))
        .map_err(|e| SynthesisError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    let Value::Array(items) = value else {
        return Err(SynthesisError::MalformedResponse("top-level value is not an array".into()));
    };

    items.iter().enumerate().map(|(index, item)| parse_card(index, item)).collect()
}

fn parse_card(index: usize, item: &Value) -> Result<Card, SynthesisError> {
    let malformed =
        |what: &str| SynthesisError::MalformedResponse(format!("card {}: {}", index, what));

    let object = item.as_object().ok_or_else(|| malformed("not an object"))?;
    let text_field = |name: &str| {
        object
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| malformed(&format!("missing or non-string \"{}\"", name)))
    };

    let title = text_field("title")?;
    let description = text_field("description")?;
    let raw_type = text_field("type")?;
    let category = Category::parse(&raw_type)
        .ok_or_else(|| malformed(&format!("invalid type \"{}\"", raw_type)))?;

    let acceptance_criteria = match object.get("acceptance_criteria") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| malformed("acceptance_criteria must contain only strings"))?,
        Some(_) => return Err(malformed("acceptance_criteria is not an array")),
    };

    let parent_index = object.get("parent_index").and_then(coerce_index).and_then(|parent| {
        if parent < index {
            Some(parent)
        } else {
            tracing::warn!(
                card = index,
                parent,
                "Ignoring parent_index that does not precede the card"
            );
            None
        }
    });

    Ok(Card { title, description, category, acceptance_criteria, parent_index })
}

/// Coerce a JSON value into a non-negative index.
fn coerce_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .and_then(|n| usize::try_from(n).ok())
}
