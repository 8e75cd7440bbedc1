//! Issue creation for synthesized cards.
//!
//! Cards are created strictly in order so a parent always exists before its
//! children. Parent references are resolved through a map keyed by the
//! card's original index: a parent whose creation failed resolves to "no
//! parent" and can never be confused with another card.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::core::{Card, LabelSettings};
use crate::integrations::{CreateIssueOptions, IssueTracker};

/// A card that was successfully turned into an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    /// Position of the card in the synthesized sequence
    pub index: usize,

    /// Issue number in the repository
    pub number: u64,

    /// Link to the issue
    pub url: String,
}

/// Creates tracker issues from cards.
pub struct Materializer<'a> {
    tracker: &'a dyn IssueTracker,
    labels: &'a LabelSettings,
}

impl<'a> Materializer<'a> {
    /// Create a materializer.
    pub fn new(tracker: &'a dyn IssueTracker, labels: &'a LabelSettings) -> Self {
        Self { tracker, labels }
    }

    /// Create one issue per card, in order.
    ///
    /// Returns one slot per card; `None` marks a card whose creation failed.
    /// Failures are logged and never abort the loop.
    pub async fn materialize(&self, cards: &[Card]) -> Vec<Option<CreatedIssue>> {
        let mut created: HashMap<usize, u64> = HashMap::new();
        let mut slots = Vec::with_capacity(cards.len());

        tracing::info!(cards = cards.len(), "Creating issues");

        for (index, card) in cards.iter().enumerate() {
            let parent = resolve_parent(card, &created);
            if let (Some(parent_index), None) = (card.parent_index, parent) {
                tracing::warn!(
                    card = index,
                    parent_index,
                    "Parent card was not created, creating without parent reference"
                );
            }

            let options = CreateIssueOptions {
                title: card.title.clone(),
                body: Some(compose_body(card, parent)),
                labels: vec![self.labels.for_category(card.category).to_string()],
            };

            match self.tracker.create_issue(options).await {
                Ok(issue) => {
                    tracing::info!(
                        number = issue.number,
                        url = %issue.html_url,
                        parent = ?parent,
                        "Created issue: {}",
                        card.title
                    );
                    created.insert(index, issue.number);
                    slots.push(Some(CreatedIssue {
                        index,
                        number: issue.number,
                        url: issue.html_url,
                    }));
                }
                Err(e) => {
                    tracing::error!(
                        card = index,
                        error = %e,
                        "Failed to create issue: {}",
                        card.title
                    );
                    slots.push(None);
                }
            }
        }

        tracing::info!(
            created = created.len(),
            requested = cards.len(),
            "Finished creating issues"
        );

        slots
    }
}

/// Issue number of the card's parent, when the parent was created.
fn resolve_parent(card: &Card, created: &HashMap<usize, u64>) -> Option<u64> {
    card.parent_index.and_then(|i| created.get(&i).copied())
}

/// Render the Markdown issue body for a card.
pub fn compose_body(card: &Card, parent: Option<u64>) -> String {
    let mut body = String::from("## Description\n\n");

    if let Some(number) = parent {
        let _ = writeln!(body, "**Parent issue:** #{}\n", number);
    }

    body.push_str(card.description.trim());
    body.push_str("\n\n## Acceptance Criteria\n\n");

    if card.acceptance_criteria.is_empty() {
        body.push_str("_No acceptance criteria provided._\n");
    } else {
        for criterion in &card.acceptance_criteria {
            let _ = writeln!(body, "- [ ] {}", criterion.trim());
        }
    }

    body.push_str("\n---\n*Generated automatically from the technical specification*\n");
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Category;

    #[test]
    fn test_checklist_rendering_order() {
        let card = Card::new("t", "d", Category::BackEnd).with_criteria(["A", "B"]);
        let body = compose_body(&card, None);

        let a = body.find("- [ ] A").unwrap();
        let b = body.find("- [ ] B").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_body_parent_reference() {
        let card = Card::new("t", "POST /orders", Category::BackEnd);

        let with_parent = compose_body(&card, Some(12));
        assert!(with_parent.contains("**Parent issue:** #12"));
        assert!(with_parent.contains("POST /orders"));

        let without = compose_body(&card, None);
        assert!(!without.contains("Parent issue"));
    }

    #[test]
    fn test_body_without_criteria() {
        let card = Card::new("t", "d", Category::FrontEnd);
        let body = compose_body(&card, None);
        assert!(body.contains("_No acceptance criteria provided._"));
        assert!(!body.contains("- [ ]"));
    }

    #[test]
    fn test_resolve_parent_uses_original_index() {
        let mut created = HashMap::new();
        created.insert(1, 42);

        let card = Card::new("c", "", Category::BackEnd);
        assert_eq!(resolve_parent(&card.clone().with_parent(1), &created), Some(42));
        assert_eq!(resolve_parent(&card.clone().with_parent(0), &created), None);
        assert_eq!(resolve_parent(&card, &created), None);
    }
}
