//! Crawler module for rendering, extraction and traversal
//!
//! This module contains the core crawling logic, including:
//! - The page renderer capability and its HTTP and browser backends
//! - Generic and forum link discovery
//! - Main content extraction
//! - The recursive crawl engine
//! - The periodic source scheduler

#[cfg(feature = "browser")]
mod browser;
mod engine;
mod extractor;
mod forum;
mod parser;
mod renderer;
mod scheduler;

#[cfg(feature = "browser")]
pub use browser::BrowserRenderer;
pub use engine::{CrawlOutcome, CrawlPlan, Crawler};
pub use extractor::{extract, extract_published_at, extract_with_min_length, MIN_TEXT_LENGTH};
pub use forum::find_post_links;
pub use parser::{discover_links, extract_links};
pub use renderer::{build_http_client, launch_renderer, HttpRenderer, PageRenderer, RenderError};
pub use scheduler::{
    due_sources, scrape_source, SchedulerHandle, SourceScheduler, MIN_POLL_INTERVAL,
};
