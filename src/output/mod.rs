//! Output module for harvested documents
//!
//! This module handles:
//! - The `CrawlResult` document model
//! - Formatting documents as markdown and reading them back
//! - Writing documents into the output directory
//! - Listing the stored library of documents

mod library;
mod markdown;
mod traits;

pub use library::{list_documents, DocumentSummary};
pub use markdown::{document_stem, format_document, parse_document};
pub use traits::{Block, CrawlResult, DocumentSink, OutputError, OutputResult};

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

/// Upper bound on collision suffixes tried for one filename
const MAX_SUFFIX: u32 = 1000;

/// Document sink writing one markdown file per result into a directory
///
/// Files are named `{domain}_{YYYYMMDD_HHMMSS}.md`. When two documents of the
/// same domain are written within the same second, the later ones get a
/// `_2`, `_3`, ... suffix instead of overwriting the earlier file.
#[derive(Debug, Clone)]
pub struct MarkdownDirectory {
    dir: PathBuf,
}

impl MarkdownDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DocumentSink for MarkdownDirectory {
    fn write(&self, result: &CrawlResult) -> OutputResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;

        let stem = document_stem(result);
        let content = format_document(result);

        for attempt in 1..=MAX_SUFFIX {
            let filename = if attempt == 1 {
                format!("{}.md", stem)
            } else {
                format!("{}_{}.md", stem, attempt)
            };
            let path = self.dir.join(filename);

            // create_new makes the existence check and the creation one step
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            file.write_all(content.as_bytes())?;
            file.flush()?;
            tracing::debug!("Wrote document {}", path.display());
            return Ok(path);
        }

        Err(OutputError::Write(format!(
            "no free filename for {} in {}",
            stem,
            self.dir.display()
        )))
    }
}
