//! Content extraction
//!
//! Picks the main content region of a rendered page through an ordered chain
//! of selectors and linearizes its headings and paragraphs. When no content
//! region matches, the whole body is used with navigation, scripts and
//! ad-like elements pruned away.

use crate::output::{Block, CrawlResult};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use scraper::{ElementRef, Html, Node, Selector};

/// Default minimum length of a kept heading or paragraph, in characters
pub const MIN_TEXT_LENGTH: usize = 20;

/// Main content candidates, first match wins
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "div.article-content",
    "div.post-content",
    "div.entry-content",
    "div#article-body",
    "div.content",
    "div#content",
];

/// Elements removed from the body fallback
const NOISE_TAGS: &[&str] = &["nav", "header", "footer", "aside", "script", "style", "iframe"];

/// Class or id fragments marking ads and page chrome
const AD_INDICATORS: &[&str] = &[
    "ad",
    "advertisement",
    "banner",
    "sidebar",
    "popup",
    "modal",
    "newsletter",
];

/// Elements whose text is never visible
const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

const BLOCK_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p";

/// The region content is taken from
struct Region<'a> {
    root: ElementRef<'a>,
    prune: bool,
}

/// Extracts the readable content of a page
///
/// Short snippets below [`MIN_TEXT_LENGTH`] characters are dropped.
pub fn extract(html: &str, url: &str) -> CrawlResult {
    extract_with_min_length(html, url, MIN_TEXT_LENGTH)
}

/// Extracts the readable content of a page with a custom length threshold
///
/// # Arguments
///
/// * `html` - The rendered HTML of the page
/// * `url` - The URL the page was rendered from
/// * `min_text_length` - Headings and paragraphs shorter than this are dropped
///
/// # Returns
///
/// A `CrawlResult` stamped with the current time. A page without usable
/// content yields a result with an empty body, not an error.
pub fn extract_with_min_length(html: &str, url: &str, min_text_length: usize) -> CrawlResult {
    let document = Html::parse_document(html);
    extract_document(&document, url, min_text_length)
}

/// Extracts the content and the declared publication date in one parse
pub(crate) fn extract_page(
    html: &str,
    url: &str,
    min_text_length: usize,
) -> (CrawlResult, Option<DateTime<Local>>) {
    let document = Html::parse_document(html);
    let result = extract_document(&document, url, min_text_length);
    (result, published_at(&document))
}

fn extract_document(document: &Html, url: &str, min_text_length: usize) -> CrawlResult {
    let body = match main_region(document) {
        Some(region) => linearize(&region, min_text_length),
        None => Vec::new(),
    };

    CrawlResult {
        title: page_title(document),
        source_url: url.to_string(),
        scraped_at: Local::now(),
        body,
    }
}

fn page_title(document: &Html) -> String {
    let title = Selector::parse("title")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .map(|element| normalize_text(&element.text().collect::<String>()))
        .unwrap_or_default();

    if title.is_empty() {
        "Untitled".to_string()
    } else {
        title
    }
}

fn main_region(document: &Html) -> Option<Region<'_>> {
    for pattern in CONTENT_SELECTORS {
        let selector = match Selector::parse(pattern) {
            Ok(selector) => selector,
            Err(_) => continue,
        };
        if let Some(root) = document.select(&selector).next() {
            tracing::trace!("Main content matched {}", pattern);
            return Some(Region { root, prune: false });
        }
    }

    let selector = Selector::parse("body").ok()?;
    let root = document.select(&selector).next()?;
    tracing::trace!("No content region, falling back to pruned body");
    Some(Region { root, prune: true })
}

fn linearize(region: &Region<'_>, min_text_length: usize) -> Vec<Block> {
    let selector = match Selector::parse(BLOCK_SELECTOR) {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut blocks = Vec::new();
    for element in region.root.select(&selector) {
        if region.prune && in_pruned_subtree(element, region.root) {
            continue;
        }

        let mut raw = String::new();
        collect_visible_text(element, region.prune, &mut raw);
        let text = normalize_text(&raw);
        if text.chars().count() < min_text_length {
            continue;
        }

        let name = element.value().name();
        let block = match heading_level(name) {
            Some(level) => Block::Heading { level, text },
            None => Block::Paragraph(text),
        };
        blocks.push(block);
    }
    blocks
}

/// Returns true if `element` or one of its ancestors below `root` is noise
fn in_pruned_subtree(element: ElementRef<'_>, root: ElementRef<'_>) -> bool {
    if is_noise(element) {
        return true;
    }

    for ancestor in element.ancestors() {
        if ancestor.id() == root.id() {
            break;
        }
        if let Some(ancestor) = ElementRef::wrap(ancestor) {
            if is_noise(ancestor) {
                return true;
            }
        }
    }
    false
}

fn is_noise(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if NOISE_TAGS.contains(&value.name()) {
        return true;
    }

    ["class", "id"].iter().any(|attr| {
        value.attr(attr).map_or(false, |v| {
            let v = v.to_lowercase();
            AD_INDICATORS.iter().any(|indicator| v.contains(indicator))
        })
    })
}

fn collect_visible_text(element: ElementRef<'_>, prune: bool, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                if INVISIBLE_TAGS.contains(&child.value().name()) {
                    continue;
                }
                if prune && is_noise(child) {
                    continue;
                }
                // Inline breaks separate words
                if child.value().name() == "br" {
                    out.push(' ');
                }
                collect_visible_text(child, prune, out);
            }
            _ => {}
        }
    }
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Trims text and collapses inner whitespace runs to single spaces
fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Finds the publication date a page declares, if any
///
/// Looks at `meta[property="article:published_time"]`, `meta[name="date"]`
/// and the first `time[datetime]`, in that order. Accepts RFC 3339
/// timestamps and plain `YYYY-MM-DD` dates (taken as local midnight).
pub fn extract_published_at(html: &str) -> Option<DateTime<Local>> {
    let document = Html::parse_document(html);
    published_at(&document)
}

fn published_at(document: &Html) -> Option<DateTime<Local>> {
    const DATE_SOURCES: &[(&str, &str)] = &[
        (r#"meta[property="article:published_time"]"#, "content"),
        (r#"meta[name="date"]"#, "content"),
        ("time[datetime]", "datetime"),
    ];

    for (pattern, attr) in DATE_SOURCES {
        let selector = match Selector::parse(pattern) {
            Ok(selector) => selector,
            Err(_) => continue,
        };
        let value = document
            .select(&selector)
            .next()
            .and_then(|element| element.value().attr(attr));
        if let Some(date) = value.and_then(parse_date) {
            return Some(date);
        }
    }
    None
}

fn parse_date(value: &str) -> Option<DateTime<Local>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Local));
    }

    let day = NaiveDate::parse_from_str(value.get(..10)?, "%Y-%m-%d").ok()?;
    Local
        .from_local_datetime(&day.and_hms_opt(0, 0, 0)?)
        .earliest()
}
