//! Integration tests for the crawl engine
//!
//! Most tests drive the engine with an in-memory renderer so the traversal
//! can be observed exactly; the HTTP renderer is exercised against wiremock
//! servers.

use async_trait::async_trait;
use gleaner::config::{CrawlSettings, RendererConfig};
use gleaner::crawler::{CrawlPlan, Crawler, HttpRenderer, PageRenderer, RenderError};
use gleaner::output::{list_documents, parse_document, Block};
use gleaner::state::VisitedSet;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SITE: &str = "https://example.com";

/// Renderer serving fixed pages and recording every render call
#[derive(Default)]
struct MockRenderer {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockRenderer {
    fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_for(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == url).count()
    }
}

#[async_trait]
impl PageRenderer for MockRenderer {
    async fn render(&self, url: &str, _wait: Duration) -> Result<String, RenderError> {
        self.calls.lock().unwrap().push(url.to_string());

        if self.failing.contains(url) {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                message: "simulated navigation failure".to_string(),
            });
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| RenderError::Http {
                url: url.to_string(),
                status: 404,
            })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn settings(output_dir: &Path) -> CrawlSettings {
    CrawlSettings {
        output_dir: output_dir.to_path_buf(),
        ..CrawlSettings::default()
    }
}

fn article(title: &str, text: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body><article><h2>{}</h2><p>{}</p></article></body></html>",
        title, title, text
    )
}

fn index(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|link| format!(r#"<li><a href="{}">{}</a></li>"#, link, link))
        .collect();
    format!("<html><body><ul>{}</ul></body></html>", anchors)
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().to_string()
}

/// Checks `{domain}_{YYYYMMDD}_{HHMMSS}.md`
fn assert_document_name(name: &str, domain: &str) {
    let stamp = name
        .strip_prefix(&format!("{}_", domain))
        .and_then(|rest| rest.strip_suffix(".md"))
        .unwrap_or_else(|| panic!("unexpected document name {}", name));
    assert_eq!(stamp.len(), 15, "unexpected timestamp in {}", name);
    assert_eq!(&stamp[8..9], "_");
    assert!(stamp
        .chars()
        .enumerate()
        .all(|(i, c)| i == 8 || c.is_ascii_digit()));
}

#[tokio::test]
async fn test_single_article_page() {
    let dir = tempfile::tempdir().unwrap();
    let html = r#"
        <html><head><title>Release notes</title></head><body>
            <article>
                <h1>Version two point zero is out</h1>
                <p>Too short</p>
                <p>This release brings a faster parser and better errors.</p>
            </article>
        </body></html>
    "#;
    let renderer = Arc::new(MockRenderer::default().page(SITE, html));
    let crawler = Crawler::new(renderer.clone(), Duration::ZERO);
    let plan = CrawlPlan::new(settings(dir.path()));

    let path = crawler.scrape(SITE, &plan, None).await.unwrap();

    assert_eq!(path.parent().unwrap(), dir.path());
    assert_document_name(&file_name(&path), "example.com");

    let document = parse_document(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document.title, "Release notes");
    assert_eq!(document.source_url, SITE);
    assert_eq!(
        document.body,
        vec![
            Block::Heading {
                level: 1,
                text: "Version two point zero is out".to_string()
            },
            Block::Paragraph("This release brings a faster parser and better errors.".to_string()),
        ]
    );
    assert_eq!(renderer.calls(), vec![SITE.to_string()]);
}

#[tokio::test]
async fn test_index_page_fans_out_to_leaves() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(
        MockRenderer::default()
            .page(SITE, &index(&["/news/1", "/news/2", "/news/3"]))
            .page(
                "https://example.com/news/1",
                &article("First story", "The first story has enough words."),
            )
            .page(
                "https://example.com/news/2",
                &article("Second story", "The second story has enough words."),
            )
            .page(
                "https://example.com/news/3",
                &article("Third story", "The third story has enough words."),
            ),
    );
    let crawler = Crawler::new(renderer.clone(), Duration::ZERO);
    let plan = CrawlPlan::new(settings(dir.path())).with_max_depth(2);

    let first = crawler.scrape(SITE, &plan, None).await.unwrap();

    let documents = list_documents(dir.path()).unwrap();
    assert_eq!(documents.len(), 3);

    let first_document = parse_document(&std::fs::read_to_string(&first).unwrap()).unwrap();
    assert_eq!(first_document.source_url, "https://example.com/news/1");

    assert_eq!(
        renderer.calls(),
        vec![
            SITE.to_string(),
            "https://example.com/news/1".to_string(),
            "https://example.com/news/2".to_string(),
            "https://example.com/news/3".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_max_depth_page_never_recurses() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(
        MockRenderer::default()
            .page(SITE, &index(&["/a", "/b"]))
            .page("https://example.com/a", &article("A", "Page A has enough text."))
            .page("https://example.com/b", &article("B", "Page B has enough text.")),
    );
    let crawler = Crawler::new(renderer.clone(), Duration::ZERO);
    let plan = CrawlPlan::new(settings(dir.path())).with_max_depth(3);

    let mut visited = VisitedSet::new();
    let path = crawler
        .scrape_from(SITE, &plan, 3, &mut visited, None)
        .await
        .unwrap();

    // The index page itself was extracted as a leaf
    let document = parse_document(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document.source_url, SITE);
    assert_eq!(renderer.calls(), vec![SITE.to_string()]);
    assert_eq!(visited.len(), 1);
}

#[tokio::test]
async fn test_shared_link_is_visited_once() {
    let dir = tempfile::tempdir().unwrap();
    let shared = "https://example.com/shared";
    let renderer = Arc::new(
        MockRenderer::default()
            .page(SITE, &index(&["/left", "/right"]))
            .page("https://example.com/left", &index(&[shared]))
            .page("https://example.com/right", &index(&[shared]))
            .page(shared, &article("Shared", "The shared page has enough text.")),
    );
    let crawler = Crawler::new(renderer.clone(), Duration::ZERO);
    let plan = CrawlPlan::new(settings(dir.path())).with_max_depth(3);

    let path = crawler.scrape(SITE, &plan, None).await;

    assert!(path.is_some());
    assert_eq!(renderer.calls_for(shared), 1);
    // The right branch found only an already visited link and produced nothing
    assert_eq!(list_documents(dir.path()).unwrap().len(), 1);
}

#[tokio::test]
async fn test_cycles_terminate_without_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(
        MockRenderer::default()
            .page(SITE, &index(&["/a"]))
            .page(
                "https://example.com/a",
                &index(&["https://example.com/b", SITE]),
            )
            .page(
                "https://example.com/b",
                &index(&["https://example.com/a", "https://example.com/c"]),
            )
            .page("https://example.com/c", &article("C", "Page C closes the loop here.")),
    );
    let crawler = Crawler::new(renderer.clone(), Duration::ZERO);
    let plan = CrawlPlan::new(settings(dir.path())).with_max_depth(10);

    let mut visited = VisitedSet::new();
    let path = crawler
        .scrape_from(SITE, &plan, 1, &mut visited, None)
        .await;

    assert!(path.is_some());
    let urls: Vec<&str> = visited.iter().collect();
    let unique: HashSet<&str> = urls.iter().copied().collect();
    assert_eq!(urls.len(), unique.len());

    let calls = renderer.calls();
    let unique_calls: HashSet<&String> = calls.iter().collect();
    assert_eq!(calls.len(), unique_calls.len());
    assert_eq!(calls.len(), visited.len());
}

#[tokio::test]
async fn test_failed_render_reports_zero_progress() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(MockRenderer::default().failing(SITE));
    let crawler = Crawler::new(renderer, Duration::ZERO);
    let plan = CrawlPlan::new(settings(dir.path()));

    let seen = Mutex::new(Vec::new());
    let progress = |fraction: f32| seen.lock().unwrap().push(fraction);

    let path = crawler.scrape(SITE, &plan, Some(&progress)).await;

    assert!(path.is_none());
    assert_eq!(seen.lock().unwrap().last(), Some(&0.0));
    assert!(list_documents(dir.path()).unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_child_does_not_affect_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(
        MockRenderer::default()
            .page(SITE, &index(&["/broken", "/ok/1", "/ok/2"]))
            .failing("https://example.com/broken")
            .page("https://example.com/ok/1", &article("One", "The first working page here."))
            .page("https://example.com/ok/2", &article("Two", "The second working page here.")),
    );
    let crawler = Crawler::new(renderer.clone(), Duration::ZERO);
    let plan = CrawlPlan::new(settings(dir.path())).with_max_depth(2);

    let first = crawler.scrape(SITE, &plan, None).await.unwrap();

    let document = parse_document(&std::fs::read_to_string(&first).unwrap()).unwrap();
    assert_eq!(document.source_url, "https://example.com/ok/1");
    assert_eq!(list_documents(dir.path()).unwrap().len(), 2);
    assert_eq!(renderer.calls().len(), 4);
}

#[tokio::test]
async fn test_progress_is_monotonic_on_index() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(
        MockRenderer::default()
            .page(SITE, &index(&["/p/1", "/p/2"]))
            .page("https://example.com/p/1", &article("One", "Enough text for page one."))
            .page("https://example.com/p/2", &article("Two", "Enough text for page two.")),
    );
    let crawler = Crawler::new(renderer, Duration::ZERO);
    let plan = CrawlPlan::new(settings(dir.path())).with_max_depth(2);

    let seen = Mutex::new(Vec::new());
    let progress = |fraction: f32| seen.lock().unwrap().push(fraction);

    crawler.scrape(SITE, &plan, Some(&progress)).await.unwrap();

    let seen = seen.lock().unwrap();
    let expected = [0.1, 0.2, 0.2, 0.6, 1.0];
    assert_eq!(seen.len(), expected.len());
    for (actual, expected) in seen.iter().zip(expected) {
        assert!((actual - expected).abs() < 1e-6, "{:?}", seen);
    }
    assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn test_persistence_failure_yields_no_result() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-directory");
    std::fs::write(&blocker, "plain file").unwrap();

    let renderer = Arc::new(
        MockRenderer::default().page(SITE, &article("Title", "Content that is long enough.")),
    );
    let crawler = Crawler::new(renderer, Duration::ZERO);
    let plan = CrawlPlan::new(settings(&blocker));

    let seen = Mutex::new(Vec::new());
    let progress = |fraction: f32| seen.lock().unwrap().push(fraction);

    assert!(crawler.scrape(SITE, &plan, Some(&progress)).await.is_none());
    assert_eq!(seen.lock().unwrap().last(), Some(&0.0));
}

#[tokio::test]
async fn test_empty_extraction_is_still_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(
        MockRenderer::default().page(SITE, "<html><body><p>tiny</p></body></html>"),
    );
    let crawler = Crawler::new(renderer, Duration::ZERO);
    let plan = CrawlPlan::new(settings(dir.path()));

    let path = crawler.scrape(SITE, &plan, None).await.unwrap();

    let document = parse_document(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document.title, "Untitled");
    assert!(document.body.is_empty());
}

#[tokio::test]
async fn test_http_renderer_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(index(&["/article", "/login", "/style.css"]), "text/html"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            article("Served article", "Served over HTTP with enough text."),
            "text/html; charset=utf-8",
        ))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let renderer = HttpRenderer::new(&RendererConfig::default()).unwrap();
    let crawler = Crawler::new(Arc::new(renderer), Duration::ZERO);
    let plan = CrawlPlan::new(settings(dir.path())).with_max_depth(2);

    let path = crawler.scrape(&base_url, &plan, None).await.unwrap();

    let document = parse_document(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document.title, "Served article");
    assert_eq!(document.source_url, format!("{}/article", base_url));
    assert!(file_name(&path).starts_with("127.0.0.1_"));
    assert_eq!(list_documents(dir.path()).unwrap().len(), 1);
}

#[tokio::test]
async fn test_http_renderer_errors() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&mock_server)
        .await;

    let renderer = HttpRenderer::new(&RendererConfig::default()).unwrap();

    let missing = renderer
        .render(&format!("{}/missing", base_url), Duration::ZERO)
        .await;
    assert!(matches!(missing, Err(RenderError::Http { status: 404, .. })));

    let json = renderer
        .render(&format!("{}/data.json", base_url), Duration::ZERO)
        .await;
    assert!(matches!(json, Err(RenderError::ContentMismatch { .. })));
}
