//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `VisitedSet`: the cycle-detection set shared by one recursive crawl
//! - `ProgressSink`: receiver for top-level crawl progress

mod progress;
mod visited;

// Re-export main types
pub use progress::{LogProgress, ProgressSink};
pub use visited::VisitedSet;
