use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Main configuration structure for Gleaner
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlSettings,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Crawl behavior configuration
///
/// A snapshot of these settings is taken at the start of every crawl and stays
/// fixed for the whole traversal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlSettings {
    /// Whether discovered links are followed at all
    pub follow_links: bool,

    /// Maximum crawl depth when following links (the seed page is depth 1)
    pub max_depth: u32,

    /// Only follow links on the same host as the page they were found on
    pub same_domain_only: bool,

    /// Path segments that mark a link as non-content (e.g. "login")
    pub ignored_path_segments: BTreeSet<String>,

    /// Path suffixes that mark a link as non-content (e.g. ".pdf")
    pub ignored_extensions: BTreeSet<String>,

    /// Directory the harvested documents are written to
    pub output_dir: PathBuf,

    /// Minimum length (in characters) of a heading or paragraph to be kept
    pub min_text_length: usize,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            follow_links: true,
            max_depth: 2,
            same_domain_only: true,
            ignored_path_segments: ["login", "logout", "signup", "register", "search"]
                .into_iter()
                .map(String::from)
                .collect(),
            ignored_extensions: [".css", ".js", ".png", ".jpg", ".jpeg", ".gif", ".pdf"]
                .into_iter()
                .map(String::from)
                .collect(),
            output_dir: PathBuf::from("scraped_data"),
            min_text_length: 20,
        }
    }
}

impl CrawlSettings {
    /// Depth bound actually used for a crawl: 1 when link following is off
    pub fn effective_depth(&self) -> u32 {
        if self.follow_links {
            self.max_depth
        } else {
            1
        }
    }
}

/// Which page renderer backs the crawler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Plain HTTP fetch, no JavaScript execution
    #[default]
    Http,
    /// Headless Chrome (requires the `browser` feature)
    Browser,
}

/// Page renderer configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RendererConfig {
    pub kind: RendererKind,

    /// Seconds to wait after navigation for dynamic content
    pub wait_seconds: u64,

    /// Navigation timeout in seconds
    pub page_load_timeout: u64,

    pub user_agent: String,

    /// Explicit Chrome binary; located automatically when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            kind: RendererKind::Http,
            wait_seconds: 5,
            page_load_timeout: 30,
            user_agent: format!("gleaner/{}", env!("CARGO_PKG_VERSION")),
            chrome_path: None,
        }
    }
}

/// Source scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SchedulerConfig {
    /// Seconds between two passes over the registered sources
    pub poll_interval_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 60,
        }
    }
}

/// A registered seed URL plus its crawl policy and last-run bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Source {
    pub url: String,

    /// Only keep pages published within this many days (0 or absent: all)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_limit: Option<u32>,

    /// Re-scrape interval in hours (0 or absent: manual only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_hours: Option<u32>,

    /// Time of the last successful crawl
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scraped: Option<DateTime<Local>>,
}

impl Source {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            days_limit: None,
            interval_hours: None,
            last_scraped: None,
        }
    }

    /// Days limit with the "0 means unlimited" convention folded in
    pub fn effective_days_limit(&self) -> Option<u32> {
        self.days_limit.filter(|&days| days > 0)
    }

    /// Returns true if the source's interval has elapsed at `now`
    ///
    /// Sources without a positive interval are manual-only and never due.
    /// A source that was never scraped is due as soon as it has an interval.
    pub fn is_due(&self, now: DateTime<Local>) -> bool {
        let hours = match self.interval_hours {
            Some(hours) if hours > 0 => hours,
            _ => return false,
        };

        match self.last_scraped {
            None => true,
            Some(last) => now - last >= Duration::hours(i64::from(hours)),
        }
    }
}

/// On-disk layout of the sources file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourceList {
    #[serde(default)]
    pub sources: Vec<Source>,
}
