//! Page renderer capability
//!
//! The crawl engine never talks to a browser or HTTP client directly: it asks
//! a [`PageRenderer`] for the final HTML of a URL. This module contains:
//! - The renderer trait and its error type
//! - `HttpRenderer`, a plain HTTP fetcher that cannot execute JavaScript
//! - `launch_renderer`, which builds the renderer named in the configuration

use crate::config::{RendererConfig, RendererKind};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors produced while rendering a page
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Renderer unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Request failed for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Expected HTML from {url}, got {content_type}")]
    ContentMismatch { url: String, content_type: String },

    #[error("Navigation timed out for {url}")]
    Timeout { url: String },

    #[error("Navigation failed for {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Rendering of {url} was cancelled")]
    Cancelled { url: String },
}

/// Loads a URL and returns its final HTML
///
/// Implementations own a single session; concurrent calls may be serialized.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Renders `url`, waiting `wait` after navigation for dynamic content
    async fn render(&self, url: &str, wait: Duration) -> Result<String, RenderError>;

    /// Short name used in log messages
    fn name(&self) -> &'static str;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The renderer configuration (user agent and timeouts)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &RendererConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.page_load_timeout))
        .connect_timeout(Duration::from_secs(config.page_load_timeout.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Renderer that fetches pages over plain HTTP
///
/// Pages are returned as served; scripts are not executed and the post-load
/// wait is not applied.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(config: &RendererConfig) -> Result<Self, RenderError> {
        let client = build_http_client(config)
            .map_err(|e| RenderError::Unavailable(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &str, _wait: Duration) -> Result<String, RenderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // A missing Content-Type is given the benefit of the doubt
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(RenderError::ContentMismatch {
                url: url.to_string(),
                content_type,
            });
        }

        response
            .text()
            .await
            .map_err(|e| classify_request_error(url, e))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

fn classify_request_error(url: &str, error: reqwest::Error) -> RenderError {
    if error.is_timeout() {
        RenderError::Timeout {
            url: url.to_string(),
        }
    } else if error.status() == Some(StatusCode::NOT_FOUND) {
        RenderError::Http {
            url: url.to_string(),
            status: 404,
        }
    } else {
        RenderError::Network {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Builds the renderer selected by the configuration
///
/// # Returns
///
/// * `Ok(renderer)` - A ready renderer session
/// * `Err(RenderError::Unavailable)` - The renderer could not be initialized
pub async fn launch_renderer(config: &RendererConfig) -> Result<Arc<dyn PageRenderer>, RenderError> {
    match config.kind {
        RendererKind::Http => Ok(Arc::new(HttpRenderer::new(config)?)),
        RendererKind::Browser => launch_browser(config).await,
    }
}

#[cfg(feature = "browser")]
async fn launch_browser(config: &RendererConfig) -> Result<Arc<dyn PageRenderer>, RenderError> {
    let renderer = crate::crawler::browser::BrowserRenderer::launch(config).await?;
    Ok(Arc::new(renderer))
}

#[cfg(not(feature = "browser"))]
async fn launch_browser(_config: &RendererConfig) -> Result<Arc<dyn PageRenderer>, RenderError> {
    Err(RenderError::Unavailable(
        "gleaner was built without the `browser` feature".to_string(),
    ))
}
