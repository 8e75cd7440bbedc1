//! External integrations module.
//!
//! Provides the issue tracker (GitHub Issues REST API) and project board
//! (GitHub Projects v2 GraphQL API) used to materialize cards.

pub mod github_issues;
pub mod github_projects;

pub use github_issues::{
    CreateIssueOptions, GitHubIssues, Issue, IssuesError, IssuesResult, Label, ListIssuesOptions,
};
pub use github_projects::{
    BoardError, BoardResult, GitHubProjects, IssueNode, ProjectItemRef,
};

use async_trait::async_trait;

/// Trait for issue trackers.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Create a new issue.
    async fn create_issue(&self, options: CreateIssueOptions) -> IssuesResult<Issue>;

    /// List issues in the repository.
    async fn list_issues(&self, options: ListIssuesOptions) -> IssuesResult<Vec<Issue>>;
}

/// Trait for project boards.
#[async_trait]
pub trait ProjectBoard: Send + Sync {
    /// Look up an issue's node id and existing board items.
    async fn issue_node(&self, number: u64) -> BoardResult<IssueNode>;

    /// Add an issue (by node id) to the board, returning the board item id.
    async fn add_item(&self, content_id: &str) -> BoardResult<String>;

    /// Set a text value on a board item's field.
    async fn set_text_field(&self, item_id: &str, field_id: &str, value: &str) -> BoardResult<()>;
}
