//! Configuration store: persisted sources and settings
//!
//! The crawler only talks to the [`ConfigStore`] trait. [`TomlConfigStore`]
//! keeps settings and sources in two TOML files; [`MemoryConfigStore`] keeps
//! them in memory. [`SourceRegistry`] serializes every read-modify-write of
//! the source list so a manual scrape and a scheduled scrape of the same
//! source cannot lose each other's update.

use crate::config::parser::{load_config, load_sources, save_config, save_sources};
use crate::config::types::{Config, Source};
use crate::config::validation::validate_source_url;
use crate::{ConfigResult, GleanerError};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Storage backend for sources and crawl settings
pub trait ConfigStore: Send {
    fn list_sources(&self) -> ConfigResult<Vec<Source>>;

    fn save_sources(&mut self, sources: &[Source]) -> ConfigResult<()>;

    fn load_settings(&self) -> ConfigResult<Config>;

    fn save_settings(&mut self, config: &Config) -> ConfigResult<()>;
}

/// Config store backed by a settings TOML file and a sources TOML file
///
/// Missing files are not an error: settings fall back to defaults and the
/// source list starts empty.
#[derive(Debug, Clone)]
pub struct TomlConfigStore {
    settings_path: PathBuf,
    sources_path: PathBuf,
}

impl TomlConfigStore {
    pub fn new(settings_path: impl Into<PathBuf>, sources_path: impl Into<PathBuf>) -> Self {
        Self {
            settings_path: settings_path.into(),
            sources_path: sources_path.into(),
        }
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    pub fn sources_path(&self) -> &Path {
        &self.sources_path
    }
}

impl ConfigStore for TomlConfigStore {
    fn list_sources(&self) -> ConfigResult<Vec<Source>> {
        if !self.sources_path.exists() {
            return Ok(Vec::new());
        }
        load_sources(&self.sources_path)
    }

    fn save_sources(&mut self, sources: &[Source]) -> ConfigResult<()> {
        save_sources(&self.sources_path, sources)
    }

    fn load_settings(&self) -> ConfigResult<Config> {
        if !self.settings_path.exists() {
            tracing::debug!(
                "No settings file at {}, using defaults",
                self.settings_path.display()
            );
            return Ok(Config::default());
        }
        load_config(&self.settings_path)
    }

    fn save_settings(&mut self, config: &Config) -> ConfigResult<()> {
        save_config(&self.settings_path, config)
    }
}

/// In-memory config store
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    config: Config,
    sources: Vec<Source>,
}

impl MemoryConfigStore {
    pub fn new(config: Config, sources: Vec<Source>) -> Self {
        Self { config, sources }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn list_sources(&self) -> ConfigResult<Vec<Source>> {
        Ok(self.sources.clone())
    }

    fn save_sources(&mut self, sources: &[Source]) -> ConfigResult<()> {
        self.sources = sources.to_vec();
        Ok(())
    }

    fn load_settings(&self) -> ConfigResult<Config> {
        Ok(self.config.clone())
    }

    fn save_settings(&mut self, config: &Config) -> ConfigResult<()> {
        self.config = config.clone();
        Ok(())
    }
}

/// Shared, serialized access to a [`ConfigStore`]
///
/// Cloning the registry shares the same underlying store.
#[derive(Clone)]
pub struct SourceRegistry {
    store: Arc<Mutex<Box<dyn ConfigStore>>>,
}

impl SourceRegistry {
    pub fn new(store: impl ConfigStore + 'static) -> Self {
        Self {
            store: Arc::new(Mutex::new(Box::new(store))),
        }
    }

    /// Returns a snapshot of all registered sources
    pub async fn list(&self) -> Result<Vec<Source>, GleanerError> {
        let store = self.store.lock().await;
        Ok(store.list_sources()?)
    }

    /// Looks up a registered source by URL
    pub async fn get(&self, url: &str) -> Result<Option<Source>, GleanerError> {
        let store = self.store.lock().await;
        Ok(store.list_sources()?.into_iter().find(|s| s.url == url))
    }

    /// Returns the current settings
    pub async fn settings(&self) -> Result<Config, GleanerError> {
        let store = self.store.lock().await;
        Ok(store.load_settings()?)
    }

    /// Replaces the stored settings
    pub async fn save_settings(&self, config: &Config) -> Result<(), GleanerError> {
        let mut store = self.store.lock().await;
        store.save_settings(config)?;
        Ok(())
    }

    /// Registers a new source
    pub async fn add(&self, source: Source) -> Result<(), GleanerError> {
        validate_source_url(&source.url)?;

        let mut store = self.store.lock().await;
        let mut sources = store.list_sources()?;
        if sources.iter().any(|s| s.url == source.url) {
            return Err(GleanerError::SourceExists { url: source.url });
        }

        tracing::info!("Registering source {}", source.url);
        sources.push(source);
        store.save_sources(&sources)?;
        Ok(())
    }

    /// Removes a registered source
    pub async fn remove(&self, url: &str) -> Result<Source, GleanerError> {
        let mut store = self.store.lock().await;
        let mut sources = store.list_sources()?;
        let index = sources
            .iter()
            .position(|s| s.url == url)
            .ok_or_else(|| GleanerError::SourceNotFound {
                url: url.to_string(),
            })?;

        let removed = sources.remove(index);
        store.save_sources(&sources)?;
        tracing::info!("Removed source {}", url);
        Ok(removed)
    }

    /// Records a successful crawl of `url` at `at`
    ///
    /// The source list is re-read under the lock so concurrent updates to
    /// other sources are preserved.
    pub async fn mark_scraped(&self, url: &str, at: DateTime<Local>) -> Result<(), GleanerError> {
        let mut store = self.store.lock().await;
        let mut sources = store.list_sources()?;
        let source = sources
            .iter_mut()
            .find(|s| s.url == url)
            .ok_or_else(|| GleanerError::SourceNotFound {
                url: url.to_string(),
            })?;

        source.last_scraped = Some(at);
        store.save_sources(&sources)?;
        tracing::debug!("Marked {} as scraped at {}", url, at);
        Ok(())
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry").finish_non_exhaustive()
    }
}
