//! Forum post link detection
//!
//! Forum software either wraps each post or thread in a recognizable
//! container, or renders a flat list of links whose URLs name the thread.
//! Both heuristics run; container matches come first.

use crate::config::CrawlSettings;
use crate::crawler::parser::{anchor_hrefs, LinkSet};
use scraper::{Html, Selector};

/// Containers that typically hold one forum post, thread or topic
const POST_CONTAINERS: &[&str] = &[
    "div.post",
    "div.thread",
    "div.topic",
    "article.forum-post",
    "div.message",
    "div.discussion",
];

/// Substrings that mark an href as pointing at forum content
const FORUM_URL_PATTERNS: &[&str] = &["topic", "thread", "discussion", "post", "forum"];

pub(crate) fn post_links_in_document(
    document: &Html,
    base_url: &str,
    settings: &CrawlSettings,
) -> Vec<String> {
    let mut links = LinkSet::default();

    // Structural pass
    for pattern in POST_CONTAINERS {
        let selector = match Selector::parse(pattern) {
            Ok(selector) => selector,
            Err(_) => continue,
        };

        for container in document.select(&selector) {
            for href in anchor_hrefs(container) {
                links.offer(href, base_url, settings);
            }
        }
    }

    // Lexical pass
    for href in anchor_hrefs(document.root_element()) {
        let lowered = href.to_lowercase();
        if FORUM_URL_PATTERNS
            .iter()
            .any(|pattern| lowered.contains(pattern))
        {
            links.offer(href, base_url, settings);
        }
    }

    links.into_vec()
}

/// Finds links to forum posts and threads on a page
///
/// # Arguments
///
/// * `html` - The rendered HTML of the page
/// * `base_url` - The URL of the page, used to resolve relative links
/// * `settings` - Crawl settings used by the link classifier
///
/// # Returns
///
/// Followable post links, each once. Links inside post containers come
/// first, grouped by container kind in the order of [`POST_CONTAINERS`]
/// rather than document order, then links recognized by their URL alone
pub fn find_post_links(html: &str, base_url: &str, settings: &CrawlSettings) -> Vec<String> {
    let document = Html::parse_document(html);
    post_links_in_document(&document, base_url, settings)
}
