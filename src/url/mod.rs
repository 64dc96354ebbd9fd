//! URL handling module for Gleaner
//!
//! This module provides link resolution, domain extraction and the link
//! classifier that decides which discovered links a crawl may follow.

mod classifier;
mod domain;
mod resolve;

// Re-export main functions
pub use classifier::is_followable;
pub use domain::{authority, extract_domain, filename_domain};
pub use resolve::resolve_link;
