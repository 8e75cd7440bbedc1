//! Board placement for created issues.

use super::{CreatedIssue, PipelineError};
use crate::core::{Card, GitHubSettings};
use crate::integrations::ProjectBoard;

/// Field ids and values written to every board item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardFields {
    /// Board node id
    pub project_id: String,

    /// Status field id
    pub status_field_id: String,

    /// Area field id
    pub area_field_id: String,

    /// Status value for new items
    pub status_value: String,
}

impl From<&GitHubSettings> for BoardFields {
    fn from(settings: &GitHubSettings) -> Self {
        Self {
            project_id: settings.project_id.clone(),
            status_field_id: settings.status_field_id.clone(),
            area_field_id: settings.area_field_id.clone(),
            status_value: settings.status_value.clone(),
        }
    }
}

/// Adds created issues to the project board.
pub struct Projector<'a> {
    board: &'a dyn ProjectBoard,
    fields: &'a BoardFields,
}

impl<'a> Projector<'a> {
    /// Create a projector.
    pub fn new(board: &'a dyn ProjectBoard, fields: &'a BoardFields) -> Self {
        Self { board, fields }
    }

    /// Add each issue to the board and set its status and area fields.
    ///
    /// `issues` and `cards` are parallel lists and must have equal length.
    /// Returns the number of issues added to the board; field update
    /// failures are logged but still count as added.
    pub async fn project(
        &self,
        issues: &[CreatedIssue],
        cards: &[Card],
    ) -> Result<usize, PipelineError> {
        if issues.len() != cards.len() {
            return Err(PipelineError::InvariantViolation {
                issues: issues.len(),
                cards: cards.len(),
            });
        }

        tracing::info!(issues = issues.len(), "Adding issues to project board");

        let mut added = 0;
        for (issue, card) in issues.iter().zip(cards) {
            if self.project_one(issue, card).await {
                added += 1;
            }
        }

        tracing::info!(added, total = issues.len(), "Finished adding issues to board");
        Ok(added)
    }

    async fn project_one(&self, issue: &CreatedIssue, card: &Card) -> bool {
        let node = match self.board.issue_node(issue.number).await {
            Ok(node) => node,
            Err(e) => {
                tracing::error!(number = issue.number, error = %e, "Failed to look up issue node");
                return false;
            }
        };

        if let Some(existing) = node.item_on(&self.fields.project_id) {
            tracing::debug!(number = issue.number, item = existing, "Issue already on board");
        }

        let item_id = match self.board.add_item(&node.id).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(number = issue.number, error = %e, "Failed to add issue to board");
                return false;
            }
        };

        let area = card.category.area_value();
        let updates = [
            ("status", &self.fields.status_field_id, self.fields.status_value.as_str()),
            ("area", &self.fields.area_field_id, area),
        ];

        for (name, field_id, value) in updates {
            if let Err(e) = self.board.set_text_field(&item_id, field_id, value).await {
                tracing::warn!(
                    number = issue.number,
                    field = name,
                    error = %e,
                    "Failed to update board field"
                );
            }
        }

        tracing::info!(
            number = issue.number,
            status = %self.fields.status_value,
            area,
            "Issue added to board"
        );
        true
    }
}
