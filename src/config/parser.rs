use crate::config::types::{Config, Source, SourceList};
use crate::config::validation::{validate, validate_sources};
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use gleaner::config::load_config;
///
/// let config = load_config(Path::new("gleaner.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Writes a configuration to the given path as TOML
pub fn save_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    validate(config)?;
    let content = toml::to_string_pretty(config)?;
    write_creating_parent(path, &content)
}

/// Loads the registered sources from a TOML sources file
pub fn load_sources(path: &Path) -> Result<Vec<Source>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let list: SourceList = toml::from_str(&content)?;
    validate_sources(&list.sources)?;
    Ok(list.sources)
}

/// Writes the registered sources to a TOML sources file
pub fn save_sources(path: &Path, sources: &[Source]) -> Result<(), ConfigError> {
    let list = SourceList {
        sources: sources.to_vec(),
    };
    let content = toml::to_string_pretty(&list)?;
    write_creating_parent(path, &content)
}

fn write_creating_parent(path: &Path, content: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be tied to the settings they used.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
