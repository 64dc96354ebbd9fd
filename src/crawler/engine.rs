//! Crawl engine
//!
//! Depth-bounded recursive traversal from a seed URL. Each visited page is
//! rendered once; a page with followable links below the depth bound is an
//! index whose links are crawled in turn, any other page is a leaf whose
//! content is extracted and persisted. Every failure is contained at the URL
//! it happened on.

use crate::config::{CrawlSettings, RendererConfig};
use crate::crawler::extractor::extract_page;
use crate::crawler::parser::discover_links;
use crate::crawler::renderer::{launch_renderer, PageRenderer, RenderError};
use crate::output::{DocumentSink, MarkdownDirectory};
use crate::state::{ProgressSink, VisitedSet};
use chrono::{DateTime, Local};
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Parameters of one top-level crawl
///
/// Settings are a snapshot taken when the crawl starts and do not change
/// while it runs.
#[derive(Debug, Clone)]
pub struct CrawlPlan {
    pub settings: CrawlSettings,

    /// Deepest level that is visited, the seed being level 1
    pub max_depth: u32,

    /// Skip leaf pages published more than this many days ago
    pub days_limit: Option<u32>,

    /// Checked before every page and raced against every render
    pub cancel: CancellationToken,
}

impl CrawlPlan {
    /// Creates a plan whose depth follows the settings
    /// (`max_depth` when following links, 1 otherwise)
    pub fn new(settings: CrawlSettings) -> Self {
        Self {
            max_depth: settings.effective_depth(),
            settings,
            days_limit: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Sets the publication cutoff; `None` and `Some(0)` mean unlimited
    pub fn with_days_limit(mut self, days_limit: Option<u32>) -> Self {
        self.days_limit = days_limit.filter(|&days| days > 0);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn cutoff(&self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        self.days_limit
            .map(|days| now - chrono::Duration::days(i64::from(days)))
    }
}

/// How a top-level crawl ended
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlOutcome {
    /// First document written, if any
    pub document: Option<PathBuf>,

    /// Leaf pages skipped for being older than the days limit
    pub outdated: usize,

    /// Pages that failed to render or save, including cancelled renders
    pub failed: usize,
}

impl CrawlOutcome {
    /// True when nothing was written only because every leaf reached was
    /// older than the days limit
    pub fn only_outdated(&self) -> bool {
        self.document.is_none() && self.outdated > 0 && self.failed == 0
    }

    /// True when the crawl completed without an error: it either wrote a
    /// document or found nothing recent enough to write
    pub fn is_settled(&self) -> bool {
        self.document.is_some() || self.only_outdated()
    }
}

/// State shared by every page of one top-level crawl
struct Walk<'a> {
    plan: &'a CrawlPlan,
    cutoff: Option<DateTime<Local>>,
    sink: &'a dyn DocumentSink,
    outdated: AtomicUsize,
    failed: AtomicUsize,
}

/// Runs crawls against one renderer session
///
/// A crawler whose renderer failed to start stays usable but every crawl
/// returns nothing.
pub struct Crawler {
    renderer: Result<Arc<dyn PageRenderer>, String>,
    wait: Duration,
    sink: Option<Arc<dyn DocumentSink>>,
}

impl Crawler {
    /// Creates a crawler over an existing renderer
    ///
    /// # Arguments
    ///
    /// * `renderer` - The page renderer session
    /// * `wait` - How long the renderer waits for dynamic content
    pub fn new(renderer: Arc<dyn PageRenderer>, wait: Duration) -> Self {
        Self {
            renderer: Ok(renderer),
            wait,
            sink: None,
        }
    }

    /// Creates a crawler without a renderer
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            renderer: Err(reason.into()),
            wait: Duration::ZERO,
            sink: None,
        }
    }

    /// Starts the renderer named in the configuration
    ///
    /// A renderer that fails to start is logged and yields an unavailable
    /// crawler rather than an error.
    pub async fn launch(config: &RendererConfig) -> Self {
        match launch_renderer(config).await {
            Ok(renderer) => {
                tracing::info!("Using {} renderer", renderer.name());
                Self::new(renderer, Duration::from_secs(config.wait_seconds))
            }
            Err(e) => {
                tracing::error!("Failed to start renderer: {}", e);
                Self::unavailable(e.to_string())
            }
        }
    }

    /// Sends documents to `sink` instead of the plan's output directory
    pub fn with_sink(mut self, sink: Arc<dyn DocumentSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn is_available(&self) -> bool {
        self.renderer.is_ok()
    }

    /// Crawls from a seed URL
    ///
    /// # Arguments
    ///
    /// * `url` - The seed URL, crawled at depth 1
    /// * `plan` - Settings, depth bound, days limit and cancellation
    /// * `progress` - Optional sink receiving progress of this crawl
    ///
    /// # Returns
    ///
    /// The path of the first document written, or `None` if the crawl
    /// produced nothing. Every document written is persisted regardless.
    pub async fn scrape(
        &self,
        url: &str,
        plan: &CrawlPlan,
        progress: Option<&dyn ProgressSink>,
    ) -> Option<PathBuf> {
        self.crawl(url, plan, progress).await.document
    }

    /// Crawls from a seed URL and reports how the crawl ended
    ///
    /// Same traversal as [`Crawler::scrape`], but tells a crawl whose leaves
    /// were all older than the days limit apart from one that failed.
    pub async fn crawl(
        &self,
        url: &str,
        plan: &CrawlPlan,
        progress: Option<&dyn ProgressSink>,
    ) -> CrawlOutcome {
        let mut visited = VisitedSet::new();
        let outcome = self.walk_from(url, plan, 1, &mut visited, progress).await;
        let status = if outcome.document.is_some() {
            "succeeded"
        } else if outcome.only_outdated() {
            "found nothing within the days limit"
        } else {
            "produced no document"
        };
        tracing::info!(
            "Crawl of {} visited {} page(s), {}",
            url,
            visited.len(),
            status
        );
        outcome
    }

    /// Crawls from `url` at `depth`, sharing `visited` with the caller
    pub async fn scrape_from(
        &self,
        url: &str,
        plan: &CrawlPlan,
        depth: u32,
        visited: &mut VisitedSet,
        progress: Option<&dyn ProgressSink>,
    ) -> Option<PathBuf> {
        self.walk_from(url, plan, depth, visited, progress)
            .await
            .document
    }

    async fn walk_from(
        &self,
        url: &str,
        plan: &CrawlPlan,
        depth: u32,
        visited: &mut VisitedSet,
        progress: Option<&dyn ProgressSink>,
    ) -> CrawlOutcome {
        if let Err(reason) = &self.renderer {
            tracing::warn!("Not crawling {}: renderer unavailable ({})", url, reason);
            return CrawlOutcome {
                failed: 1,
                ..CrawlOutcome::default()
            };
        }

        let default_sink;
        let sink: &dyn DocumentSink = match &self.sink {
            Some(sink) => sink.as_ref(),
            None => {
                default_sink = MarkdownDirectory::new(&plan.settings.output_dir);
                &default_sink
            }
        };

        let walk = Walk {
            plan,
            cutoff: plan.cutoff(Local::now()),
            sink,
            outdated: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        };

        let document = self.visit(&walk, url, depth, visited, progress).await;
        CrawlOutcome {
            document,
            outdated: walk.outdated.into_inner(),
            failed: walk.failed.into_inner(),
        }
    }

    fn visit<'a>(
        &'a self,
        walk: &'a Walk<'a>,
        url: &'a str,
        depth: u32,
        visited: &'a mut VisitedSet,
        progress: Option<&'a dyn ProgressSink>,
    ) -> BoxFuture<'a, Option<PathBuf>> {
        Box::pin(async move {
            let plan = walk.plan;

            if depth > plan.max_depth || visited.contains(url) {
                return None;
            }
            if plan.cancel.is_cancelled() {
                tracing::debug!("Crawl cancelled before {}", url);
                walk.failed.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            visited.insert(url);

            let renderer = self.renderer.as_ref().ok()?;
            let report = |fraction: f32| {
                if let Some(progress) = progress {
                    progress.report(fraction);
                }
            };

            tracing::info!("Scraping {} (depth {}/{})", url, depth, plan.max_depth);
            report(0.1);

            let rendered = tokio::select! {
                _ = plan.cancel.cancelled() => Err(RenderError::Cancelled { url: url.to_string() }),
                html = renderer.render(url, self.wait) => html,
            };
            let html = match rendered {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!("{}", e);
                    walk.failed.fetch_add(1, Ordering::Relaxed);
                    report(0.0);
                    return None;
                }
            };
            report(0.2);

            let links = if depth < plan.max_depth {
                discover_links(&html, url, &plan.settings)
            } else {
                Vec::new()
            };

            if !links.is_empty() {
                tracing::info!("Found {} links to follow at depth {}", links.len(), depth);

                let total = links.len() as f32;
                let mut first = None;
                for (index, link) in links.iter().enumerate() {
                    if plan.cancel.is_cancelled() {
                        walk.failed.fetch_add(1, Ordering::Relaxed);
                        break;
                    }
                    report(0.2 + 0.8 * index as f32 / total);

                    if visited.contains(link) {
                        tracing::debug!("Already visited {}", link);
                        continue;
                    }
                    if let Some(path) = self.visit(walk, link, depth + 1, visited, None).await {
                        first.get_or_insert(path);
                    }
                }

                report(1.0);
                return first;
            }

            let (result, published) = extract_page(&html, url, plan.settings.min_text_length);
            if let (Some(cutoff), Some(published)) = (walk.cutoff, published) {
                if published < cutoff {
                    tracing::info!(
                        "Skipping {}: published {} is past the {}-day limit",
                        url,
                        published.format("%Y-%m-%d"),
                        plan.days_limit.unwrap_or_default()
                    );
                    walk.outdated.fetch_add(1, Ordering::Relaxed);
                    report(1.0);
                    return None;
                }
            }
            if result.is_empty() {
                tracing::debug!("No content extracted from {}", url);
            }
            report(0.8);

            match walk.sink.write(&result) {
                Ok(path) => {
                    tracing::info!("Saved {} to {}", url, path.display());
                    report(1.0);
                    Some(path)
                }
                Err(e) => {
                    tracing::error!("Failed to save {}: {}", url, e);
                    walk.failed.fetch_add(1, Ordering::Relaxed);
                    report(0.0);
                    None
                }
            }
        })
    }
}

impl std::fmt::Debug for Crawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let renderer = match &self.renderer {
            Ok(renderer) => renderer.name().to_string(),
            Err(reason) => format!("unavailable ({})", reason),
        };
        f.debug_struct("Crawler")
            .field("renderer", &renderer)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}
