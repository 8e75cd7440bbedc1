//! Configuration management for specboard.
//!
//! Settings come from the process environment, optionally seeded from a
//! `.env` file. Every required value is checked up front so a run never
//! fails halfway through because of a missing token.

use std::collections::HashMap;
use std::path::Path;

use super::Category;

/// Gemini API key.
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
/// GitHub token with `repo` and `project` scopes.
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
/// Repository owner (user or organization).
pub const GITHUB_OWNER: &str = "GITHUB_OWNER";
/// Repository name.
pub const GITHUB_REPO: &str = "GITHUB_REPO";
/// Node id of the Projects v2 board.
pub const GITHUB_PROJECT_ID: &str = "GITHUB_PROJECT_ID";
/// Node id of the board's status field.
pub const GITHUB_STATUS_FIELD_ID: &str = "GITHUB_STATUS_FIELD_ID";
/// Node id of the board's functional-area field.
pub const GITHUB_AREA_FIELD_ID: &str = "GITHUB_AREA_FIELD_ID";

/// Variables that must be present and non-blank.
pub const REQUIRED_VARS: &[&str] = &[
    GEMINI_API_KEY,
    GITHUB_TOKEN,
    GITHUB_OWNER,
    GITHUB_REPO,
    GITHUB_PROJECT_ID,
    GITHUB_STATUS_FIELD_ID,
    GITHUB_AREA_FIELD_ID,
];

/// Default status written to every new board item.
pub const DEFAULT_STATUS_VALUE: &str = "Backlog";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("failed to load env file {path}: {message}")]
    EnvFile { path: String, message: String },
}

/// Fully resolved run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Language model settings
    pub model: ModelSettings,

    /// Repository and board settings
    pub github: GitHubSettings,

    /// Issue labels per category
    pub labels: LabelSettings,
}

/// Language model settings.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    /// API key
    pub api_key: String,

    /// Model name override (provider default when unset)
    pub model: Option<String>,

    /// API base URL override (provider default when unset)
    pub base_url: Option<String>,
}

/// Repository and board settings.
#[derive(Debug, Clone)]
pub struct GitHubSettings {
    /// API token
    pub token: String,

    /// Repository owner
    pub owner: String,

    /// Repository name
    pub repo: String,

    /// Projects v2 board node id
    pub project_id: String,

    /// Status field node id
    pub status_field_id: String,

    /// Functional-area field node id
    pub area_field_id: String,

    /// Status value written to new items
    pub status_value: String,
}

/// Label names applied to created issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSettings {
    pub frontend: String,
    pub backend: String,
    /// Reserved for cards spanning both areas; no category maps to it yet.
    pub fullstack: String,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            frontend: "frontend".to_string(),
            backend: "backend".to_string(),
            fullstack: "fullstack".to_string(),
        }
    }
}

impl LabelSettings {
    /// Label applied to issues of the given category.
    pub fn for_category(&self, category: Category) -> &str {
        match category {
            Category::FrontEnd => &self.frontend,
            Category::BackEnd => &self.backend,
        }
    }
}

impl Settings {
    /// Build settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    ///
    /// Blank values count as missing. All missing names are reported at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut found: HashMap<&str, String> = HashMap::new();
        let mut missing = Vec::new();
        for key in REQUIRED_VARS.iter().copied() {
            match get(key) {
                Some(value) => {
                    found.insert(key, value);
                }
                None => missing.push(key.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let mut take = |key: &str| found.remove(key).unwrap_or_default();
        let defaults = LabelSettings::default();

        Ok(Self {
            model: ModelSettings {
                api_key: take(GEMINI_API_KEY),
                model: get("GEMINI_MODEL"),
                base_url: get("GEMINI_BASE_URL"),
            },
            github: GitHubSettings {
                token: take(GITHUB_TOKEN),
                owner: take(GITHUB_OWNER),
                repo: take(GITHUB_REPO),
                project_id: take(GITHUB_PROJECT_ID),
                status_field_id: take(GITHUB_STATUS_FIELD_ID),
                area_field_id: take(GITHUB_AREA_FIELD_ID),
                status_value: get("GITHUB_STATUS_VALUE")
                    .unwrap_or_else(|| DEFAULT_STATUS_VALUE.to_string()),
            },
            labels: LabelSettings {
                frontend: get("FRONTEND_LABEL").unwrap_or(defaults.frontend),
                backend: get("BACKEND_LABEL").unwrap_or(defaults.backend),
                fullstack: get("FULLSTACK_LABEL").unwrap_or(defaults.fullstack),
            },
        })
    }
}

/// Load a `.env` file into the process environment.
///
/// With an explicit path the file must exist. Without one, a `.env` in the
/// current directory is loaded when present. Variables already set in the
/// process are never overridden.
pub fn load_env_file(path: Option<&Path>) -> Result<(), ConfigError> {
    match path {
        Some(path) => dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
        None => match dotenvy::dotenv() {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "Loaded .env file");
                Ok(())
            }
            Err(e) if e.not_found() => Ok(()),
            Err(e) => {
                Err(ConfigError::EnvFile { path: ".env".to_string(), message: e.to_string() })
            }
        },
    }
}
