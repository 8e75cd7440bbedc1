//! GitHub Projects (v2) integration.
//!
//! Talks to GitHub's GraphQL API to place issues on a project board and
//! fill in the board's custom fields.

use async_trait::async_trait;
use serde::Deserialize;

use super::ProjectBoard;

/// GitHub GraphQL endpoint.
const GRAPHQL_URL: &str = "https://api.github.com/graphql";

const ISSUE_NODE_QUERY: &str = r#"
    query($owner: String!, $repo: String!, $issueNumber: Int!) {
        repository(owner: $owner, name: $repo) {
            issue(number: $issueNumber) {
                id
                projectItems(first: 10) {
                    nodes {
                        id
                        project {
                            id
                        }
                    }
                }
            }
        }
    }
"#;

const ADD_ITEM_MUTATION: &str = r#"
    mutation($projectId: ID!, $contentId: ID!) {
        addProjectV2ItemById(input: {
            projectId: $projectId
            contentId: $contentId
        }) {
            item {
                id
            }
        }
    }
"#;

const UPDATE_FIELD_MUTATION: &str = r#"
    mutation($projectId: ID!, $itemId: ID!, $fieldId: ID!, $value: String!) {
        updateProjectV2ItemFieldValue(input: {
            projectId: $projectId
            itemId: $itemId
            fieldId: $fieldId
            value: {
                text: $value
            }
        }) {
            projectV2Item {
                id
            }
        }
    }
"#;

/// GitHub Projects v2 client bound to one board.
#[derive(Debug, Clone)]
pub struct GitHubProjects {
    /// GitHub API token
    token: String,
    /// Repository owner
    owner: String,
    /// Repository name
    repo: String,
    /// Board node id
    project_id: String,
    /// GraphQL endpoint
    endpoint: String,
    /// HTTP client
    client: reqwest::Client,
}

/// An issue's GraphQL node and its existing board memberships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueNode {
    /// Global node id of the issue
    pub id: String,
    /// Board items already overlaying this issue
    pub project_items: Vec<ProjectItemRef>,
}

impl IssueNode {
    /// Board item id on the given project, if the issue is already there.
    pub fn item_on(&self, project_id: &str) -> Option<&str> {
        self.project_items.iter().find(|i| i.project_id == project_id).map(|i| i.id.as_str())
    }
}

/// A board item referencing an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectItemRef {
    /// Board item id
    pub id: String,
    /// Board node id
    pub project_id: String,
}

/// Result type for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

/// Error types for board operations.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GraphQL error: {0}")]
    GraphQL(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimited,
}

impl GitHubProjects {
    /// Create a new client for a board.
    pub fn new(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            project_id: project_id.into(),
            endpoint: GRAPHQL_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Use a different GraphQL endpoint (GitHub Enterprise).
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Execute a GraphQL query.
    async fn query<T: for<'de> Deserialize<'de>>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> BoardResult<T> {
        let body = serde_json::json!({ "query": query, "variables": variables });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "specboard")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(BoardError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(BoardError::RateLimited);
        }

        let result: serde_json::Value = response.json().await?;
        extract_data(result)
    }
}

/// Pull `data` out of a GraphQL response, surfacing the first error.
fn extract_data<T: for<'de> Deserialize<'de>>(result: serde_json::Value) -> BoardResult<T> {
    if let Some(errors) = result.get("errors") {
        if let Some(first_error) = errors.as_array().and_then(|e| e.first()) {
            let message =
                first_error.get("message").and_then(|m| m.as_str()).unwrap_or("Unknown error");
            return Err(BoardError::GraphQL(message.to_string()));
        }
    }

    let data = result
        .get("data")
        .filter(|d| !d.is_null())
        .ok_or_else(|| BoardError::GraphQL("No data in response".to_string()))?;

    serde_json::from_value(data.clone())
        .map_err(|e| BoardError::GraphQL(format!("Failed to parse response: {}", e)))
}

#[async_trait]
impl ProjectBoard for GitHubProjects {
    async fn issue_node(&self, number: u64) -> BoardResult<IssueNode> {
        #[derive(Deserialize)]
        struct Response {
            repository: Option<Repository>,
        }

        #[derive(Deserialize)]
        struct Repository {
            issue: Option<IssueData>,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct IssueData {
            id: String,
            project_items: Nodes<ItemData>,
        }

        #[derive(Deserialize)]
        struct Nodes<T> {
            nodes: Vec<T>,
        }

        #[derive(Deserialize)]
        struct ItemData {
            id: String,
            project: ProjectData,
        }

        #[derive(Deserialize)]
        struct ProjectData {
            id: String,
        }

        let variables = serde_json::json!({
            "owner": self.owner,
            "repo": self.repo,
            "issueNumber": number,
        });

        let response: Response = self.query(ISSUE_NODE_QUERY, variables).await?;
        let issue = response
            .repository
            .and_then(|r| r.issue)
            .ok_or_else(|| BoardError::NotFound(format!("issue #{}", number)))?;

        Ok(IssueNode {
            id: issue.id,
            project_items: issue
                .project_items
                .nodes
                .into_iter()
                .map(|i| ProjectItemRef { id: i.id, project_id: i.project.id })
                .collect(),
        })
    }

    async fn add_item(&self, content_id: &str) -> BoardResult<String> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            add_project_v2_item_by_id: Option<AddPayload>,
        }

        #[derive(Deserialize)]
        struct AddPayload {
            item: Option<Item>,
        }

        #[derive(Deserialize)]
        struct Item {
            id: String,
        }

        let variables = serde_json::json!({
            "projectId": self.project_id,
            "contentId": content_id,
        });

        let response: Response = self.query(ADD_ITEM_MUTATION, variables).await?;
        response
            .add_project_v2_item_by_id
            .and_then(|p| p.item)
            .map(|i| i.id)
            .ok_or_else(|| BoardError::GraphQL("No board item returned".to_string()))
    }

    async fn set_text_field(&self, item_id: &str, field_id: &str, value: &str) -> BoardResult<()> {
        let variables = serde_json::json!({
            "projectId": self.project_id,
            "itemId": item_id,
            "fieldId": field_id,
            "value": value,
        });

        let _: serde_json::Value = self.query(UPDATE_FIELD_MUTATION, variables).await?;
        Ok(())
    }
}
