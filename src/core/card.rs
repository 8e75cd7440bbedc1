//! Card data structures.
//!
//! Defines the `Card` struct that represents one development requirement
//! synthesized from a specification document, plus the `PriorItem` list
//! used to steer the model away from work that already exists.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum number of characters kept from a prior item's description.
pub const PRIOR_SNIPPET_CHARS: usize = 200;

/// A development requirement synthesized from the specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Short title, used as the issue title
    pub title: String,

    /// Technically specific description of the work
    pub description: String,

    /// Functional area of the work
    pub category: Category,

    /// Ordered acceptance criteria (may be empty)
    pub acceptance_criteria: Vec<String>,

    /// Index of the parent card within the same sequence.
    /// Always strictly smaller than this card's own index.
    pub parent_index: Option<usize>,
}

impl Card {
    /// Create a card with no acceptance criteria and no parent.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category,
            acceptance_criteria: Vec::new(),
            parent_index: None,
        }
    }

    /// Set the acceptance criteria.
    pub fn with_criteria<I, S>(mut self, criteria: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.acceptance_criteria = criteria.into_iter().map(Into::into).collect();
        self
    }

    /// Set the parent index.
    pub fn with_parent(mut self, index: usize) -> Self {
        self.parent_index = Some(index);
        self
    }

    /// One-line representation used in progress output.
    pub fn short_display(&self) -> String {
        format!("[{}] {}", self.category, self.title)
    }
}

/// Functional area of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// UI, screens, forms, UX, visual components
    FrontEnd,

    /// API, persistence, authentication, business rules, services
    BackEnd,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Self; 2] = [Self::FrontEnd, Self::BackEnd];

    /// Parse the `type` value emitted by the model.
    ///
    /// Accepts `FrontEnd`/`BackEnd` and the display forms `Front-End`/`Back-End`,
    /// ignoring case and any hyphen, underscore or space.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "frontend" => Some(Self::FrontEnd),
            "backend" => Some(Self::BackEnd),
            _ => None,
        }
    }

    /// Name used in the model contract.
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::FrontEnd => "FrontEnd",
            Self::BackEnd => "BackEnd",
        }
    }

    /// Option value of the board's functional-area field.
    pub const fn area_value(self) -> &'static str {
        match self {
            Self::FrontEnd => "Front-End",
            Self::BackEnd => "Back-end",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FrontEnd => "Front-End",
            Self::BackEnd => "Back-End",
        })
    }
}

/// An item that already exists in the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorItem {
    /// Existing item title
    pub title: String,

    /// Truncated description
    pub snippet: String,
}

impl PriorItem {
    /// Create a prior item, truncating the description to [`PRIOR_SNIPPET_CHARS`].
    pub fn new(title: impl Into<String>, description: &str) -> Self {
        Self { title: title.into(), snippet: truncate_chars(description, PRIOR_SNIPPET_CHARS) }
    }
}

/// Truncate to at most `max` characters, never splitting a character.
pub fn truncate_chars(text: &str, max: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", text[..end].trim_end()),
        None => text.to_string(),
    }
}

/// Count cards per category.
pub fn count_by_category(cards: &[Card], category: Category) -> usize {
    cards.iter().filter(|c| c.category == category).count()
}
