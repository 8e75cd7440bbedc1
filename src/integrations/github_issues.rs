//! GitHub Issues integration.
//!
//! Provides the REST calls specboard needs: creating the issues for
//! synthesized cards and listing existing issues so the model can avoid
//! duplicating them.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::IssueTracker;

/// GitHub REST API base URL.
const API_BASE: &str = "https://api.github.com";

/// GitHub Issues API client.
#[derive(Debug, Clone)]
pub struct GitHubIssues {
    /// GitHub API token
    token: String,
    /// Repository owner
    owner: String,
    /// Repository name
    repo: String,
    /// API base URL
    base_url: String,
    /// HTTP client
    client: reqwest::Client,
}

/// A GitHub issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Issue number
    pub number: u64,
    /// Issue title
    pub title: String,
    /// Issue body/description
    #[serde(default)]
    pub body: Option<String>,
    /// Issue state (open, closed)
    #[serde(default)]
    pub state: String,
    /// Issue labels
    #[serde(default)]
    pub labels: Vec<Label>,
    /// HTML URL to the issue
    #[serde(default)]
    pub html_url: String,
    /// Present when the item is a pull request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    /// Whether this entry is a pull request rather than an issue.
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// A GitHub label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    /// Label name
    pub name: String,
}

/// Options for creating a new issue.
#[derive(Debug, Clone, Default)]
pub struct CreateIssueOptions {
    /// Issue title (required)
    pub title: String,
    /// Issue body/description
    pub body: Option<String>,
    /// Labels to add
    pub labels: Vec<String>,
}

/// Options for listing issues.
#[derive(Debug, Clone, Default)]
pub struct ListIssuesOptions {
    /// Filter by state: open, closed, all
    pub state: Option<String>,
    /// Maximum number of results
    pub per_page: Option<u32>,
}

/// Result type for GitHub Issues operations.
pub type IssuesResult<T> = Result<T, IssuesError>;

/// Error types for GitHub Issues operations.
#[derive(Debug, thiserror::Error)]
pub enum IssuesError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error: {message} (status: {status})")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GitHubIssues {
    /// Create a new GitHub Issues client.
    pub fn new(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            base_url: API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Use a different API base URL (GitHub Enterprise).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the API URL for a path under this repository.
    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.owner,
            self.repo,
            path
        )
    }

    /// Make an authenticated request.
    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "specboard")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Parse error response from GitHub API.
    async fn parse_error(&self, response: reqwest::Response) -> IssuesError {
        let status = response.status().as_u16();

        match status {
            401 => IssuesError::Unauthorized,
            403 | 429 => {
                // Check if rate limited
                if status == 429
                    || response
                        .headers()
                        .get("x-ratelimit-remaining")
                        .and_then(|v| v.to_str().ok())
                        .is_some_and(|s| s == "0")
                {
                    return IssuesError::RateLimited;
                }
                IssuesError::Api { status, message: "Forbidden".to_string() }
            }
            404 => IssuesError::NotFound(format!("{}/{}", self.owner, self.repo)),
            _ => {
                let message = response
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                    .unwrap_or_else(|| format!("HTTP {}", status));
                IssuesError::Api { status, message }
            }
        }
    }
}

#[async_trait]
impl IssueTracker for GitHubIssues {
    async fn create_issue(&self, options: CreateIssueOptions) -> IssuesResult<Issue> {
        if options.title.trim().is_empty() {
            return Err(IssuesError::InvalidInput("Title is required".to_string()));
        }

        let url = self.api_url("issues");

        let mut body: HashMap<&str, serde_json::Value> = HashMap::new();
        body.insert("title", serde_json::json!(options.title));

        if let Some(desc) = &options.body {
            body.insert("body", serde_json::json!(desc));
        }
        if !options.labels.is_empty() {
            body.insert("labels", serde_json::json!(options.labels));
        }

        let response = self.request(reqwest::Method::POST, &url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(self.parse_error(response).await);
        }

        let issue: Issue = response.json().await?;
        Ok(issue)
    }

    async fn list_issues(&self, options: ListIssuesOptions) -> IssuesResult<Vec<Issue>> {
        let mut params: Vec<(&str, String)> = Vec::new();

        if let Some(state) = options.state {
            params.push(("state", state));
        }
        if let Some(per_page) = options.per_page {
            params.push(("per_page", per_page.to_string()));
        }

        let response = self
            .request(reqwest::Method::GET, &self.api_url("issues"))
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.parse_error(response).await);
        }

        let issues: Vec<Issue> = response.json().await?;
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let github = GitHubIssues::new("t", "acme", "shop");
        assert_eq!(github.api_url("issues"), "https://api.github.com/repos/acme/shop/issues");

        let enterprise = github.with_base_url("https://ghe.example.com/api/v3/");
        assert_eq!(
            enterprise.api_url("issues"),
            "https://ghe.example.com/api/v3/repos/acme/shop/issues"
        );
    }

    #[test]
    fn test_issue_deserializes_minimal_payload() {
        let issue: Issue = serde_json::from_str(
            r#"{"number": 7, "title": "Login", "html_url": "https://github.com/a/b/issues/7"}"#,
        )
        .unwrap();
        assert_eq!(issue.number, 7);
        assert!(issue.body.is_none());
        assert!(!issue.is_pull_request());
    }

    #[test]
    fn test_pull_request_detected() {
        let issue: Issue = serde_json::from_str(
            r#"{"number": 8, "title": "Fix", "pull_request": {"url": "x"}}"#,
        )
        .unwrap();
        assert!(issue.is_pull_request());
    }

    #[test]
    fn test_create_issue_options_default() {
        let options = CreateIssueOptions::default();
        assert!(options.title.is_empty());
        assert!(options.body.is_none());
        assert!(options.labels.is_empty());
    }

    #[tokio::test]
    async fn test_create_issue_requires_title() {
        let github = GitHubIssues::new("t", "acme", "shop");
        let result = github.create_issue(CreateIssueOptions::default()).await;
        assert!(matches!(result, Err(IssuesError::InvalidInput(_))));
    }
}
