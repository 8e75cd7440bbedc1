//! Run pipeline.
//!
//! Drives a single run: extract the document, gather prior tracker items,
//! synthesize cards, create issues, and place them on the board. Every
//! external call is awaited in sequence.

mod materializer;
mod projector;

pub use materializer::{compose_body, CreatedIssue, Materializer};
pub use projector::{BoardFields, Projector};

use std::path::Path;

use crate::ai::{SynthesisError, Synthesizer};
use crate::core::{count_by_category, Card, Category, LabelSettings, PriorItem};
use crate::document::{DocumentError, DocumentSource};
use crate::integrations::{IssueTracker, ListIssuesOptions, ProjectBoard};

/// Maximum prior items fetched from the tracker.
const PRIOR_ITEMS_PAGE: u32 = 100;

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extraction(#[from] DocumentError),

    #[error("No text or tables could be extracted from the document")]
    ExtractionEmpty,

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("No cards generated")]
    NoCards,

    #[error("No issues could be created")]
    NoIssuesCreated,

    #[error("Created issues ({issues}) and cards ({cards}) are out of step")]
    InvariantViolation { issues: usize, cards: usize },
}

/// Run behavior switches.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Stop after synthesis without touching the tracker or board
    pub dry_run: bool,

    /// Include existing tracker items in the prompt
    pub use_existing: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { dry_run: false, use_existing: true }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Cards returned by the model
    pub cards: Vec<Card>,

    /// Issues created, in card order
    pub issues: Vec<CreatedIssue>,

    /// Issues placed on the board
    pub board_items: usize,

    /// Whether the run stopped after synthesis
    pub dry_run: bool,
}

impl RunSummary {
    /// Number of issues created.
    pub fn issues_created(&self) -> usize {
        self.issues.len()
    }

    /// Multi-line human-readable summary.
    pub fn to_summary_string(&self) -> String {
        let mut lines = Vec::new();

        if self.dry_run {
            lines.push(format!("Dry run: {} cards generated, nothing created", self.cards.len()));
        } else {
            lines.push(format!(
                "Issues created: {}/{}",
                self.issues_created(),
                self.cards.len()
            ));
            lines.push(format!(
                "Board items added: {}/{}",
                self.board_items,
                self.issues_created()
            ));
        }

        for category in Category::ALL {
            lines.push(format!("  {}: {}", category, count_by_category(&self.cards, category)));
        }

        lines.join("\n")
    }
}

/// One configured run from document to board.
pub struct Pipeline {
    source: Box<dyn DocumentSource>,
    synthesizer: Synthesizer,
    tracker: Box<dyn IssueTracker>,
    board: Box<dyn ProjectBoard>,
    labels: LabelSettings,
    fields: BoardFields,
    options: RunOptions,
}

impl Pipeline {
    /// Create a pipeline with default run options.
    pub fn new(
        source: Box<dyn DocumentSource>,
        synthesizer: Synthesizer,
        tracker: Box<dyn IssueTracker>,
        board: Box<dyn ProjectBoard>,
        labels: LabelSettings,
        fields: BoardFields,
    ) -> Self {
        Self {
            source,
            synthesizer,
            tracker,
            board,
            labels,
            fields,
            options: RunOptions::default(),
        }
    }

    /// Override run options.
    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the pipeline against a document.
    pub async fn run(&self, path: &Path) -> Result<RunSummary, PipelineError> {
        tracing::info!(path = %path.display(), "Extracting document");
        let content = self.source.extract(path)?;
        if content.is_empty() {
            return Err(PipelineError::ExtractionEmpty);
        }

        let prior_items = if self.options.use_existing {
            self.fetch_prior_items().await
        } else {
            tracing::info!("Ignoring existing tracker items");
            Vec::new()
        };

        let cards = self.synthesizer.synthesize(&content, &prior_items).await?;
        if cards.is_empty() {
            return Err(PipelineError::NoCards);
        }

        if self.options.dry_run {
            tracing::info!(cards = cards.len(), "Dry run, skipping issue creation");
            return Ok(RunSummary { cards, issues: Vec::new(), board_items: 0, dry_run: true });
        }

        let slots =
            Materializer::new(self.tracker.as_ref(), &self.labels).materialize(&cards).await;

        let (issues, created_cards): (Vec<CreatedIssue>, Vec<Card>) = slots
            .into_iter()
            .flatten()
            .map(|issue| {
                let card = cards[issue.index].clone();
                (issue, card)
            })
            .unzip();

        if issues.is_empty() {
            return Err(PipelineError::NoIssuesCreated);
        }

        let board_items = Projector::new(self.board.as_ref(), &self.fields)
            .project(&issues, &created_cards)
            .await?;

        Ok(RunSummary { cards, issues, board_items, dry_run: false })
    }

    /// Existing issues as prompt context. Failures degrade to an empty list.
    async fn fetch_prior_items(&self) -> Vec<PriorItem> {
        let options = ListIssuesOptions {
            state: Some("all".to_string()),
            per_page: Some(PRIOR_ITEMS_PAGE),
            ..Default::default()
        };

        match self.tracker.list_issues(options).await {
            Ok(issues) => {
                let items: Vec<PriorItem> = issues
                    .into_iter()
                    .filter(|issue| !issue.is_pull_request())
                    .map(|issue| PriorItem::new(issue.title, issue.body.as_deref().unwrap_or("")))
                    .collect();
                tracing::info!(count = items.len(), "Loaded existing tracker items");
                items
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Failed to fetch existing issues, continuing without them"
                );
                Vec::new()
            }
        }
    }
}
