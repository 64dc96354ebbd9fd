//! Gleaner: a content-harvesting web crawler
//!
//! This crate renders pages, extracts their readable article or forum content,
//! follows eligible same-domain links up to a bounded depth and stores one
//! markdown document per harvested page. A source scheduler re-runs crawls for
//! registered sources on a per-source interval.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Gleaner operations
#[derive(Debug, Error)]
pub enum GleanerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render error: {0}")]
    Render(#[from] crawler::RenderError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Source already registered: {url}")]
    SourceExists { url: String },

    #[error("No registered source for {url}")]
    SourceNotFound { url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Gleaner operations
pub type Result<T> = std::result::Result<T, GleanerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, CrawlSettings, Source};
pub use crawler::{CrawlPlan, Crawler, PageRenderer, SourceScheduler};
pub use output::{Block, CrawlResult};
pub use state::{ProgressSink, VisitedSet};
pub use url::{extract_domain, is_followable, resolve_link};
