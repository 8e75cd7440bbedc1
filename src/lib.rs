//! # Specboard
//!
//! Turn a PDF technical specification into GitHub issues and Projects v2
//! board items.
//!
//! Specboard extracts the document's text and tables, asks a generative
//! model for implementation cards (skipping work already tracked in the
//! repository), creates one issue per card with parent references, and
//! places every issue on the project board with its status and area set.
//!
//! ## Features
//!
//! - **Duplicate Awareness**: Existing issues are sent to the model as context
//! - **Hierarchy**: Cards may reference an earlier card as their parent
//! - **Resilience**: Throttled model calls back off exponentially; per-issue
//!   failures never abort the run
//! - **Dry Run**: Preview cards without touching the tracker
//!
//! ## Quick Start
//!
//! ```bash
//! # Configure credentials in .env, then
//! specboard requirements.pdf
//!
//! # Preview only
//! specboard --dry-run requirements.pdf
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::needless_lifetimes)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

pub mod ai;
pub mod core;
pub mod document;
pub mod integrations;
pub mod pipeline;

pub use ai::{GeminiProvider, LanguageModel, ModelError, SynthesisError, Synthesizer};
pub use document::{DocumentContent, DocumentError, DocumentSource, PdfExtractor, Table};
pub use integrations::{
    BoardError, CreateIssueOptions, GitHubIssues, GitHubProjects, Issue, IssueNode, IssueTracker,
    IssuesError, ListIssuesOptions, ProjectBoard,
};
pub use pipeline::{
    BoardFields, CreatedIssue, Materializer, Pipeline, PipelineError, Projector, RunOptions,
    RunSummary,
};

// Re-export commonly used types
pub use core::{Card, Category, ConfigError, LabelSettings, PriorItem, Settings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "specboard";
