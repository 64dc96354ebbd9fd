//! Generic link discovery
//!
//! Collects every anchor on a page that the link classifier accepts, and
//! merges it with the forum-post links into the candidate list a crawl
//! follows.

use crate::config::CrawlSettings;
use crate::crawler::forum::post_links_in_document;
use crate::url::{is_followable, resolve_link};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Ordered, de-duplicating accumulator of followable links
#[derive(Debug, Default)]
pub(crate) struct LinkSet {
    seen: HashSet<String>,
    links: Vec<String>,
}

impl LinkSet {
    /// Resolves `href` against `page_url` and keeps it if it is followable
    /// and new
    pub(crate) fn offer(&mut self, href: &str, page_url: &str, settings: &CrawlSettings) {
        let resolved = match resolve_link(href, page_url) {
            Some(resolved) => resolved,
            None => return,
        };

        if !is_followable(&resolved, page_url, settings) {
            tracing::trace!("Not following {}", resolved);
            return;
        }

        if self.seen.insert(resolved.clone()) {
            self.links.push(resolved);
        }
    }

    pub(crate) fn extend(&mut self, links: Vec<String>) {
        for link in links {
            if self.seen.insert(link.clone()) {
                self.links.push(link);
            }
        }
    }

    pub(crate) fn into_vec(self) -> Vec<String> {
        self.links
    }
}

/// Hrefs of every `<a href>` below `root`, in document order
///
/// Anchors carrying a `download` attribute point at files, not pages, and are
/// skipped.
pub(crate) fn anchor_hrefs<'a>(root: ElementRef<'a>) -> Vec<&'a str> {
    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    root.select(&selector)
        .filter(|anchor| anchor.value().attr("download").is_none())
        .filter_map(|anchor| anchor.value().attr("href"))
        .collect()
}

pub(crate) fn links_in_document(
    document: &Html,
    page_url: &str,
    settings: &CrawlSettings,
) -> Vec<String> {
    let mut links = LinkSet::default();
    for href in anchor_hrefs(document.root_element()) {
        links.offer(href, page_url, settings);
    }
    links.into_vec()
}

/// Extracts every followable link on the page
///
/// # Arguments
///
/// * `html` - The rendered HTML of the page
/// * `page_url` - The URL of the page, used to resolve relative links
/// * `settings` - Crawl settings used by the link classifier
///
/// # Returns
///
/// Absolute, de-duplicated links in document order
pub fn extract_links(html: &str, page_url: &str, settings: &CrawlSettings) -> Vec<String> {
    let document = Html::parse_document(html);
    links_in_document(&document, page_url, settings)
}

/// Builds the candidate list a crawl follows from a page
///
/// Generic links come first, followed by forum-post links not already
/// present. Each URL appears once.
pub fn discover_links(html: &str, page_url: &str, settings: &CrawlSettings) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut candidates = LinkSet::default();
    candidates.extend(links_in_document(&document, page_url, settings));
    candidates.extend(post_links_in_document(&document, page_url, settings));
    candidates.into_vec()
}
