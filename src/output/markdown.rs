//! Markdown document format
//!
//! Every harvested page is stored as a small markdown file:
//!
//! ```text
//! # {title}
//!
//! Source: {url}
//! Date scraped: {YYYY-MM-DD HH:MM:SS}
//!
//! ## A heading
//!
//! A paragraph.
//! ```
//!
//! Paragraphs that start with `#` are written with a leading backslash so they
//! are not read back as headings.

use crate::output::traits::{Block, CrawlResult, OutputError, OutputResult};
use crate::url::filename_domain;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

const SOURCE_PREFIX: &str = "Source: ";
const DATE_PREFIX: &str = "Date scraped: ";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILENAME_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

/// Base filename of a document: `{domain}_{YYYYMMDD_HHMMSS}`
///
/// The `.md` extension and any collision suffix are added by the sink.
pub fn document_stem(result: &CrawlResult) -> String {
    format!(
        "{}_{}",
        filename_domain(&result.source_url),
        result.scraped_at.format(FILENAME_TIMESTAMP)
    )
}

/// Formats a crawl result as a markdown document
pub fn format_document(result: &CrawlResult) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {}\n\n", result.title));
    md.push_str(&format!("{}{}\n", SOURCE_PREFIX, result.source_url));
    md.push_str(&format!(
        "{}{}\n\n",
        DATE_PREFIX,
        result.scraped_at.format(DATE_FORMAT)
    ));

    for block in &result.body {
        match block {
            Block::Heading { level, text } => {
                let level = (*level).clamp(1, 6) as usize;
                md.push_str(&format!("\n{} {}\n", "#".repeat(level), text));
            }
            Block::Paragraph(text) => {
                // Leading '#' or '\' gets one escaping backslash
                if text.starts_with('#') || text.starts_with('\\') {
                    md.push_str(&format!("\n\\{}\n", text));
                } else {
                    md.push_str(&format!("\n{}\n", text));
                }
            }
        }
    }

    md
}

/// Parses a markdown document written by [`format_document`]
///
/// # Returns
///
/// * `Ok(CrawlResult)` - The recovered title, source, date and body
/// * `Err(OutputError::Format)` - The header lines are missing or malformed
pub fn parse_document(content: &str) -> OutputResult<CrawlResult> {
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());

    let title = lines
        .next()
        .and_then(|line| line.strip_prefix("# "))
        .ok_or_else(|| OutputError::Format("missing title line".to_string()))?
        .trim()
        .to_string();

    let source_url = lines
        .next()
        .and_then(|line| line.strip_prefix(SOURCE_PREFIX))
        .ok_or_else(|| OutputError::Format("missing source line".to_string()))?
        .trim()
        .to_string();

    let date = lines
        .next()
        .and_then(|line| line.strip_prefix(DATE_PREFIX))
        .ok_or_else(|| OutputError::Format("missing date line".to_string()))?;
    let scraped_at = parse_timestamp(date.trim())?;

    let body = lines.map(parse_block).collect();

    Ok(CrawlResult {
        title,
        source_url,
        scraped_at,
        body,
    })
}

fn parse_block(line: &str) -> Block {
    if let Some(escaped) = line.strip_prefix('\\') {
        return Block::Paragraph(escaped.to_string());
    }

    let level = line.chars().take_while(|&c| c == '#').count();
    if (1..=6).contains(&level) {
        if let Some(text) = line[level..].strip_prefix(' ') {
            return Block::Heading {
                level: level as u8,
                text: text.to_string(),
            };
        }
    }

    Block::Paragraph(line.to_string())
}

fn parse_timestamp(raw: &str) -> OutputResult<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| OutputError::Format(format!("bad date '{}': {}", raw, e)))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| OutputError::Format(format!("nonexistent local time '{}'", raw)))
}
