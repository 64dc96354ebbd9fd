//! Headless Chrome page renderer
//!
//! One browser process per renderer. Navigations are serialized through a
//! mutex because the session is a single stateful resource. The browser
//! process is killed when the renderer is dropped.

use crate::config::RendererConfig;
use crate::crawler::renderer::{PageRenderer, RenderError};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Extra Chrome flags for unattended crawling
const CHROME_ARGS: &[&str] = &[
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-popup-blocking",
    "--disable-notifications",
];

/// Well-known Chrome install locations, checked in order
const CHROME_LOCATIONS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome Beta",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome Canary",
    "/usr/bin/google-chrome",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe",
    "C:\\Program Files (x86)\\Google\\Chrome\\Application\\chrome.exe",
];

/// Renderer backed by a headless Chrome session
pub struct BrowserRenderer {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
    page_load_timeout: Duration,
}

impl BrowserRenderer {
    /// Launches Chrome and starts its event handler
    ///
    /// # Returns
    ///
    /// * `Ok(BrowserRenderer)` - A running browser session
    /// * `Err(RenderError::Unavailable)` - Chrome could not be configured or started
    pub async fn launch(config: &RendererConfig) -> Result<Self, RenderError> {
        let page_load_timeout = Duration::from_secs(config.page_load_timeout);

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(page_load_timeout);

        for arg in CHROME_ARGS {
            builder = builder.arg(*arg);
        }

        match config.chrome_path.clone().or_else(locate_chrome) {
            Some(path) => {
                tracing::info!("Using Chrome binary at {}", path.display());
                builder = builder.chrome_executable(path);
            }
            None => {
                tracing::warn!("Chrome not found in standard locations, relying on auto-detection");
            }
        }

        let browser_config = builder.build().map_err(RenderError::Unavailable)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| RenderError::Unavailable(format!("failed to launch Chrome: {}", e)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::info!("Headless Chrome session started");

        Ok(Self {
            browser: Mutex::new(browser),
            handler,
            page_load_timeout,
        })
    }
}

#[async_trait]
impl PageRenderer for BrowserRenderer {
    async fn render(&self, url: &str, wait: Duration) -> Result<String, RenderError> {
        let browser = self.browser.lock().await;

        let navigation_error = |e: chromiumoxide::error::CdpError| RenderError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        };

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(navigation_error)?;

        let navigated = tokio::time::timeout(self.page_load_timeout, page.goto(url)).await;
        match navigated {
            Err(_) => {
                let _ = page.close().await;
                return Err(RenderError::Timeout {
                    url: url.to_string(),
                });
            }
            Ok(Err(e)) => {
                let _ = page.close().await;
                return Err(navigation_error(e));
            }
            Ok(Ok(_)) => {}
        }

        tokio::time::sleep(wait).await;

        let html = page.content().await.map_err(navigation_error);
        let _ = page.close().await;
        html
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}

impl Drop for BrowserRenderer {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn locate_chrome() -> Option<PathBuf> {
    CHROME_LOCATIONS
        .iter()
        .map(Path::new)
        .find(|path| path.exists())
        .map(Path::to_path_buf)
}
