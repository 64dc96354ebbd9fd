//! Integration tests for the source scheduler

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Local};
use gleaner::config::{Config, MemoryConfigStore, Source, SourceRegistry};
use gleaner::crawler::{
    scrape_source, Crawler, PageRenderer, RenderError, SourceScheduler, MIN_POLL_INTERVAL,
};
use gleaner::GleanerError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const OLD_PAGE: &str = "<html><head><title>Old page</title>\
    <meta property=\"article:published_time\" content=\"2001-01-01T00:00:00Z\"></head><body>\
    <article><p>Archived content that is long enough.</p></article></body></html>";

const PAGE: &str = "<html><head><title>Source page</title></head><body>\
    <article><p>Scheduled content that is long enough.</p></article></body></html>";

/// Renderer serving the same page for known URLs and failing for the rest
struct SiteRenderer {
    pages: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl SiteRenderer {
    fn serving(urls: &[&str]) -> Self {
        Self {
            pages: urls
                .iter()
                .map(|url| (url.to_string(), PAGE.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn serving_old(url: &str) -> Self {
        Self {
            pages: HashMap::from([(url.to_string(), OLD_PAGE.to_string())]),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls_for(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == url)
            .count()
    }
}

#[async_trait]
impl PageRenderer for SiteRenderer {
    async fn render(&self, url: &str, _wait: Duration) -> Result<String, RenderError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| RenderError::Timeout {
                url: url.to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "site"
    }
}

fn config(output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.output_dir = output_dir.to_path_buf();
    config
}

fn scheduled(url: &str, interval_hours: u32, hours_ago: Option<i64>) -> Source {
    Source {
        interval_hours: Some(interval_hours),
        last_scraped: hours_ago.map(|h| Local::now() - ChronoDuration::hours(h)),
        ..Source::new(url)
    }
}

fn find<'a>(sources: &'a [Source], url: &str) -> &'a Source {
    sources.iter().find(|s| s.url == url).unwrap()
}

#[tokio::test]
async fn test_tick_crawls_only_due_sources() {
    let dir = tempfile::tempdir().unwrap();
    let stale = scheduled("https://stale.example/", 24, Some(25));
    let fresh = scheduled("https://fresh.example/", 24, Some(1));
    let fresh_last = fresh.last_scraped;

    let registry = SourceRegistry::new(MemoryConfigStore::new(
        config(dir.path()),
        vec![stale.clone(), fresh],
    ));
    let renderer = Arc::new(SiteRenderer::serving(&[
        "https://stale.example/",
        "https://fresh.example/",
    ]));
    let crawler = Arc::new(Crawler::new(renderer.clone(), Duration::ZERO));
    let scheduler = SourceScheduler::new(crawler, registry.clone(), Duration::from_secs(60));

    let crawled = scheduler
        .run_tick(Local::now(), &CancellationToken::new())
        .await;

    assert_eq!(crawled, vec!["https://stale.example/".to_string()]);
    assert_eq!(renderer.calls_for("https://fresh.example/"), 0);

    let sources = registry.list().await.unwrap();
    assert!(find(&sources, "https://stale.example/").last_scraped > stale.last_scraped);
    assert_eq!(find(&sources, "https://fresh.example/").last_scraped, fresh_last);
}

#[tokio::test]
async fn test_failed_source_is_retried_next_tick() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SourceRegistry::new(MemoryConfigStore::new(
        config(dir.path()),
        vec![scheduled("https://down.example/", 1, None)],
    ));
    let renderer = Arc::new(SiteRenderer::serving(&[]));
    let crawler = Arc::new(Crawler::new(renderer.clone(), Duration::ZERO));
    let scheduler = SourceScheduler::new(crawler, registry.clone(), Duration::from_secs(60));
    let cancel = CancellationToken::new();

    assert!(scheduler.run_tick(Local::now(), &cancel).await.is_empty());
    assert!(scheduler.run_tick(Local::now(), &cancel).await.is_empty());

    assert_eq!(renderer.calls_for("https://down.example/"), 2);
    let sources = registry.list().await.unwrap();
    assert_eq!(sources[0].last_scraped, None);
}

#[tokio::test]
async fn test_manual_sources_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SourceRegistry::new(MemoryConfigStore::new(
        config(dir.path()),
        vec![Source::new("https://manual.example/")],
    ));
    let renderer = Arc::new(SiteRenderer::serving(&["https://manual.example/"]));
    let crawler = Arc::new(Crawler::new(renderer.clone(), Duration::ZERO));
    let scheduler = SourceScheduler::new(crawler, registry, Duration::from_secs(60));

    let crawled = scheduler
        .run_tick(Local::now(), &CancellationToken::new())
        .await;

    assert!(crawled.is_empty());
    assert_eq!(renderer.calls_for("https://manual.example/"), 0);
}

#[tokio::test]
async fn test_scrape_source_records_success() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SourceRegistry::new(MemoryConfigStore::new(
        config(dir.path()),
        vec![Source::new("https://manual.example/")],
    ));
    let crawler = Crawler::new(
        Arc::new(SiteRenderer::serving(&["https://manual.example/"])),
        Duration::ZERO,
    );

    let outcome = scrape_source(
        &crawler,
        &registry,
        "https://manual.example/",
        &CancellationToken::new(),
        None,
    )
    .await
    .unwrap();

    assert!(outcome.document.unwrap().starts_with(dir.path()));
    let source = registry.get("https://manual.example/").await.unwrap().unwrap();
    assert!(source.last_scraped.is_some());
}

#[tokio::test]
async fn test_scrape_unknown_source() {
    let registry = SourceRegistry::new(MemoryConfigStore::default());
    let crawler = Crawler::new(Arc::new(SiteRenderer::serving(&[])), Duration::ZERO);

    let result = scrape_source(
        &crawler,
        &registry,
        "https://unknown.example/",
        &CancellationToken::new(),
        None,
    )
    .await;

    assert!(matches!(result, Err(GleanerError::SourceNotFound { .. })));
}

#[tokio::test]
async fn test_unavailable_renderer_leaves_sources_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SourceRegistry::new(MemoryConfigStore::new(
        config(dir.path()),
        vec![scheduled("https://site.example/", 1, None)],
    ));
    let crawler = Arc::new(Crawler::unavailable("no browser installed"));
    let scheduler = SourceScheduler::new(crawler, registry.clone(), Duration::from_secs(60));

    let crawled = scheduler
        .run_tick(Local::now(), &CancellationToken::new())
        .await;

    assert!(crawled.is_empty());
    assert_eq!(registry.list().await.unwrap()[0].last_scraped, None);
}

#[tokio::test]
async fn test_started_scheduler_crawls_and_stops() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SourceRegistry::new(MemoryConfigStore::new(
        config(dir.path()),
        vec![scheduled("https://site.example/", 1, None)],
    ));
    let crawler = Arc::new(Crawler::new(
        Arc::new(SiteRenderer::serving(&["https://site.example/"])),
        Duration::ZERO,
    ));

    let handle =
        SourceScheduler::new(crawler, registry.clone(), Duration::from_millis(20)).start();

    let marked = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let sources = registry.list().await.unwrap();
            if sources[0].last_scraped.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    let token = handle.cancellation_token();
    handle.stop().await;

    assert!(marked.is_ok(), "scheduler never crawled the due source");
    assert!(token.is_cancelled());
}

#[tokio::test]
async fn test_outdated_source_waits_for_its_interval() {
    let dir = tempfile::tempdir().unwrap();
    let source = Source {
        days_limit: Some(7),
        ..scheduled("https://archive.example/", 24, None)
    };
    let registry = SourceRegistry::new(MemoryConfigStore::new(config(dir.path()), vec![source]));
    let renderer = Arc::new(SiteRenderer::serving_old("https://archive.example/"));
    let crawler = Arc::new(Crawler::new(renderer.clone(), Duration::ZERO));
    let scheduler = SourceScheduler::new(crawler, registry.clone(), Duration::from_secs(60));
    let cancel = CancellationToken::new();

    let first = scheduler.run_tick(Local::now(), &cancel).await;
    scheduler.run_tick(Local::now(), &cancel).await;
    scheduler.run_tick(Local::now(), &cancel).await;

    assert_eq!(first, vec!["https://archive.example/".to_string()]);
    assert_eq!(renderer.calls_for("https://archive.example/"), 1);
    let sources = registry.list().await.unwrap();
    assert!(sources[0].last_scraped.is_some());
    assert_eq!(std::fs::read_dir(dir.path()).map(|d| d.count()).unwrap_or(0), 0);
}

#[tokio::test]
async fn test_scrape_source_reports_outdated_crawl() {
    let dir = tempfile::tempdir().unwrap();
    let source = Source {
        days_limit: Some(7),
        ..Source::new("https://archive.example/")
    };
    let registry = SourceRegistry::new(MemoryConfigStore::new(config(dir.path()), vec![source]));
    let crawler = Crawler::new(
        Arc::new(SiteRenderer::serving_old("https://archive.example/")),
        Duration::ZERO,
    );

    let outcome = scrape_source(
        &crawler,
        &registry,
        "https://archive.example/",
        &CancellationToken::new(),
        None,
    )
    .await
    .unwrap();

    assert!(outcome.document.is_none());
    assert!(outcome.only_outdated());
    let source = registry.get("https://archive.example/").await.unwrap().unwrap();
    assert!(source.last_scraped.is_some());
}

#[tokio::test]
async fn test_zero_poll_interval_starts_and_stops() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SourceRegistry::new(MemoryConfigStore::new(
        config(dir.path()),
        vec![scheduled("https://site.example/", 1, None)],
    ));
    let crawler = Arc::new(Crawler::new(
        Arc::new(SiteRenderer::serving(&["https://site.example/"])),
        Duration::ZERO,
    ));

    let scheduler = SourceScheduler::new(crawler, registry, Duration::ZERO);
    assert_eq!(scheduler.poll_interval(), MIN_POLL_INTERVAL);

    let handle = scheduler.start();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let stopped = tokio::time::timeout(Duration::from_secs(5), handle.stop()).await;

    assert!(stopped.is_ok(), "scheduler with a zero poll interval did not stop");
}
