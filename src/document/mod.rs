//! Document extraction module.
//!
//! Turns a specification document into plain text plus the tables found in
//! it. The rest of the pipeline only sees [`DocumentContent`].

mod pdf;
mod tables;

pub use pdf::PdfExtractor;
pub use tables::{detect_tables, split_row};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors raised while reading a document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to parse PDF {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of document content.
pub trait DocumentSource: Send + Sync {
    /// Extract text and tables from the document at `path`.
    fn extract(&self, path: &Path) -> Result<DocumentContent, DocumentError>;
}

/// A table found in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// 1-based page number
    pub page: u32,

    /// 1-based table number within the page
    pub table_number: u32,

    /// First row of the table
    pub headers: Vec<String>,

    /// Remaining rows
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Number of data rows (headers excluded).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Serialized form of a table, as embedded in prompts.
#[derive(Serialize)]
struct TableRecord<'a> {
    page: u32,
    table_number: u32,
    headers: &'a [String],
    rows: &'a [Vec<String>],
    row_count: usize,
}

/// Text and tables extracted from a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentContent {
    /// Full text, pages separated by blank lines
    pub text: String,

    /// Tables in page order
    pub tables: Vec<Table>,
}

impl DocumentContent {
    /// Create content from text and tables.
    pub fn new(text: impl Into<String>, tables: Vec<Table>) -> Self {
        Self { text: text.into(), tables }
    }

    /// True when there is neither text nor a table to work with.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.tables.is_empty()
    }

    /// JSON array of all tables.
    pub fn tables_json(&self) -> String {
        let records: Vec<TableRecord<'_>> = self
            .tables
            .iter()
            .map(|t| TableRecord {
                page: t.page,
                table_number: t.table_number,
                headers: &t.headers,
                rows: &t.rows,
                row_count: t.row_count(),
            })
            .collect();

        serde_json::to_string_pretty(&records).unwrap_or_else(|_| "[]".to_string())
    }
}
