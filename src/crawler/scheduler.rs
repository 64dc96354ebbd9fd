//! Source scheduler
//!
//! A single background task that wakes on a fixed poll interval, works out
//! which registered sources are due and crawls them one after another.
//! A source is marked scraped when its crawl produced a document or found
//! nothing newer than the source's days limit; failed sources are retried
//! on the next tick.

use crate::config::{Source, SourceRegistry};
use crate::crawler::engine::{CrawlOutcome, CrawlPlan, Crawler};
use crate::state::ProgressSink;
use crate::GleanerError;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Returns the sources due for a crawl at `now`, in registration order
pub fn due_sources(sources: &[Source], now: DateTime<Local>) -> Vec<&Source> {
    sources.iter().filter(|source| source.is_due(now)).collect()
}

/// Crawls one registered source and records the crawl once it settles
///
/// Settings are read from the registry when the crawl starts; the source's
/// days limit applies. A crawl whose pages were all older than the days
/// limit counts as settled, so the source waits for its next interval.
///
/// # Returns
///
/// * `Ok(outcome)` - `last_scraped` was updated if `outcome.is_settled()`
/// * `Err(GleanerError)` - The source is unknown or the store failed
pub async fn scrape_source(
    crawler: &Crawler,
    registry: &SourceRegistry,
    url: &str,
    cancel: &CancellationToken,
    progress: Option<&dyn ProgressSink>,
) -> Result<CrawlOutcome, GleanerError> {
    let source = registry
        .get(url)
        .await?
        .ok_or_else(|| GleanerError::SourceNotFound {
            url: url.to_string(),
        })?;
    let config = registry.settings().await?;

    let plan = CrawlPlan::new(config.crawler)
        .with_days_limit(source.days_limit)
        .with_cancellation(cancel.clone());

    let outcome = crawler.crawl(&source.url, &plan, progress).await;
    if outcome.is_settled() {
        registry.mark_scraped(&source.url, Local::now()).await?;
    }
    Ok(outcome)
}

/// Shortest poll interval a scheduler runs with
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Periodically re-crawls registered sources
pub struct SourceScheduler {
    crawler: Arc<Crawler>,
    registry: SourceRegistry,
    poll_interval: Duration,
}

impl SourceScheduler {
    /// Creates a scheduler; `poll_interval` is raised to at least
    /// [`MIN_POLL_INTERVAL`]
    pub fn new(crawler: Arc<Crawler>, registry: SourceRegistry, poll_interval: Duration) -> Self {
        if poll_interval < MIN_POLL_INTERVAL {
            tracing::warn!(
                "Poll interval {:?} is too short, using {:?}",
                poll_interval,
                MIN_POLL_INTERVAL
            );
        }
        Self {
            crawler,
            registry,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Crawls every source due at `now`, sequentially
    ///
    /// # Returns
    ///
    /// URLs of the sources whose crawl settled during this tick
    pub async fn run_tick(&self, now: DateTime<Local>, cancel: &CancellationToken) -> Vec<String> {
        let sources = match self.registry.list().await {
            Ok(sources) => sources,
            Err(e) => {
                tracing::error!("Failed to list sources: {}", e);
                return Vec::new();
            }
        };

        let due = due_sources(&sources, now);
        if due.is_empty() {
            tracing::debug!("No sources due");
            return Vec::new();
        }
        tracing::info!("{} of {} source(s) due", due.len(), sources.len());

        let mut crawled = Vec::new();
        for source in due {
            if cancel.is_cancelled() {
                break;
            }

            match scrape_source(&self.crawler, &self.registry, &source.url, cancel, None).await {
                Ok(outcome) if outcome.is_settled() => crawled.push(source.url.clone()),
                Ok(_) => {
                    tracing::warn!("Scheduled crawl of {} failed, retrying next tick", source.url)
                }
                Err(e) => tracing::error!("Scheduled crawl of {} failed: {}", source.url, e),
            }
        }
        crawled
    }

    /// Spawns the polling loop
    ///
    /// The first tick runs immediately. The loop ends when the returned
    /// handle is stopped; a crawl in progress is cancelled at its next page.
    pub fn start(self) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            tracing::info!(
                "Source scheduler started, polling every {}s",
                self.poll_interval.as_secs()
            );

            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let crawled = self.run_tick(Local::now(), &token).await;
                        if !crawled.is_empty() {
                            tracing::info!("Scheduler crawled {} source(s)", crawled.len());
                        }
                    }
                }
            }

            tracing::info!("Source scheduler stopped");
        });

        SchedulerHandle { cancel, task }
    }
}

/// Handle to a running [`SourceScheduler`]
pub struct SchedulerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Token cancelled when the scheduler stops
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops the polling loop and waits for it to finish
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!("Source scheduler task failed: {}", e);
        }
    }
}
