//! Document types, the document sink trait and output errors

use chrono::{DateTime, Local};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Malformed document: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One linearized unit of extracted content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A heading with its level (1 to 6)
    Heading { level: u8, text: String },

    /// A paragraph of running text
    Paragraph(String),
}

impl Block {
    /// The block's text, whatever its kind
    pub fn text(&self) -> &str {
        match self {
            Block::Heading { text, .. } => text,
            Block::Paragraph(text) => text,
        }
    }
}

/// The extracted content of one harvested page
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlResult {
    /// Page title, "Untitled" when the page has none
    pub title: String,

    /// URL the content was extracted from
    pub source_url: String,

    /// When the page was extracted
    pub scraped_at: DateTime<Local>,

    /// Headings and paragraphs in document order
    pub body: Vec<Block>,
}

impl CrawlResult {
    /// Returns true if no content survived extraction
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Destination for harvested documents
///
/// Implementations persist a result and return where it was stored.
pub trait DocumentSink: Send + Sync {
    fn write(&self, result: &CrawlResult) -> OutputResult<PathBuf>;
}
