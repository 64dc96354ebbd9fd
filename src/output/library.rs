//! Listing of harvested documents

use crate::output::markdown::parse_document;
use crate::output::traits::OutputResult;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Header information of a stored document
#[derive(Debug, Clone)]
pub struct DocumentSummary {
    pub path: PathBuf,
    pub title: String,
    pub source_url: String,
    pub scraped_at: DateTime<Local>,
    /// Number of headings and paragraphs in the body
    pub blocks: usize,
}

/// Lists every readable document in `dir`, newest first
///
/// A missing directory is an empty library. Files that are not `.md` or do not
/// parse as documents are skipped.
pub fn list_documents(dir: &Path) -> OutputResult<Vec<DocumentSummary>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut documents = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Skipping unreadable document {}: {}", path.display(), e);
                continue;
            }
        };

        match parse_document(&content) {
            Ok(document) => documents.push(DocumentSummary {
                path,
                title: document.title,
                source_url: document.source_url,
                scraped_at: document.scraped_at,
                blocks: document.body.len(),
            }),
            Err(e) => {
                tracing::debug!("Skipping {}: {}", path.display(), e);
            }
        }
    }

    documents.sort_by(|a, b| {
        b.scraped_at
            .cmp(&a.scraped_at)
            .then_with(|| a.path.cmp(&b.path))
    });

    Ok(documents)
}
