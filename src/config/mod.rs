//! Configuration module for Gleaner
//!
//! This module handles loading, validating and saving the TOML settings file
//! and the registered source list, and provides the shared source registry.
//!
//! # Example
//!
//! ```no_run
//! use gleaner::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("gleaner.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod store;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlSettings, RendererConfig, RendererKind, SchedulerConfig, Source, SourceList,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_sources, parse_config,
    save_config, save_sources,
};

pub use store::{ConfigStore, MemoryConfigStore, SourceRegistry, TomlConfigStore};
pub use validation::{validate, validate_crawl_settings, validate_source_url};
