//! Google Gemini API integration.
//!
//! Implements the LanguageModel trait for Gemini's `generateContent` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{LanguageModel, ModelError};

/// Default Gemini API endpoint.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini API provider.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create with a specific model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Create with a specific base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1beta/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Map a non-success response to a model error.
    async fn parse_error(&self, response: reqwest::Response) -> ModelError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        classify_error(status, &body, &self.model)
    }
}

/// Classify a failed Gemini response.
///
/// HTTP 429 and `RESOURCE_EXHAUSTED` mean throttling; HTTP 404 means the
/// model name is unknown.
fn classify_error(status: u16, body: &str, model: &str) -> ModelError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);
    let api_status = parsed.as_ref().and_then(|e| e.status.as_deref()).unwrap_or_default();

    if status == 429 || api_status == "RESOURCE_EXHAUSTED" {
        return ModelError::RateLimited;
    }
    if status == 404 || api_status == "NOT_FOUND" {
        return ModelError::ModelNotFound(model.to_string());
    }

    let message = parsed.and_then(|e| e.message).unwrap_or_else(|| {
        if body.is_empty() {
            format!("HTTP {}", status)
        } else {
            body.to_string()
        }
    });
    ModelError::Api { status, message }
}

/// Concatenate the text parts of the first candidate.
fn candidate_text(response: GenerateResponse) -> Option<String> {
    let candidate = response.candidates.into_iter().next()?;
    let text: String = candidate.content?.parts.into_iter().filter_map(|p| p.text).collect();
    (!text.trim().is_empty()).then_some(text)
}

#[async_trait]
impl LanguageModel for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let request = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: Some(prompt.to_string()) }] }],
            generation_config: GenerationConfig { temperature: 0.2 },
        };

        let response = self
            .client
            .post(self.url(&format!("models/{}:generateContent", self.model)))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.parse_error(response).await);
        }

        let response: GenerateResponse = response.json().await?;
        candidate_text(response).ok_or(ModelError::EmptyResponse)
    }

    async fn list_models(&self) -> Result<Vec<String>, ModelError> {
        let response = self
            .client
            .get(self.url("models"))
            .header("x-goog-api-key", &self.api_key)
            .query(&[("pageSize", "100")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.parse_error(response).await);
        }

        let response: ModelList = response.json().await?;
        Ok(response
            .models
            .into_iter()
            .filter(|m| m.supported_generation_methods.iter().any(|s| s == "generateContent"))
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect())
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Gemini generateContent request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

/// Gemini generateContent response.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_defaults() {
        let provider = GeminiProvider::new("key");
        assert_eq!(provider.name(), DEFAULT_MODEL);
        assert_eq!(
            provider.url("models"),
            "https://generativelanguage.googleapis.com/v1beta/models"
        );
    }

    #[test]
    fn test_with_model_and_base_url() {
        let provider =
            GeminiProvider::new("key").with_model("gemini-2.0-flash").with_base_url("http://x/");
        assert_eq!(provider.name(), "gemini-2.0-flash");
        assert_eq!(provider.url("models"), "http://x/v1beta/models");
    }

    #[test]
    fn test_classify_rate_limit_by_status() {
        assert!(classify_error(429, "", "m").is_rate_limited());
    }

    #[test]
    fn test_classify_resource_exhausted() {
        let body =
            r#"{"error":{"code":403,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert!(classify_error(403, body, "m").is_rate_limited());
    }

    #[test]
    fn test_classify_model_not_found() {
        let body =
            r#"{"error":{"code":404,"message":"models/x is not found","status":"NOT_FOUND"}}"#;
        match classify_error(404, body, "x") {
            ModelError::ModelNotFound(model) => assert_eq!(model, "x"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classify_other_api_error() {
        let body =
            r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        match classify_error(400, body, "m") {
            ModelError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_candidate_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"[{"},{"text":"}]"}],"role":"m"}}]}"#,
        )
        .unwrap();
        assert_eq!(candidate_text(response).as_deref(), Some("[{}]"));
    }

    #[test]
    fn test_candidate_text_empty() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(candidate_text(response).is_none());
    }
}
