use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::infrastructure::abi::{
    DecoderOptions, DEFAULT_MAX_FILES_IN_CACHE, DEFAULT_MAX_SELECTORS_IN_CACHE, DEFAULT_PREFIX_LENGTH,
};
use crate::store::{EvictionPolicy, DEFAULT_SWEEP_INTERVAL};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Directory of `<prefix>.json` shard files
    #[default]
    Files,
    /// Single SQLite database file
    Sqlite,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionMode {
    #[default]
    Insert,
    Interval,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
    pub backend: Backend,
    pub prefix_length: usize,
    pub max_files_in_cache: usize,
    pub max_selectors_in_cache: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            backend: Backend::Files,
            prefix_length: DEFAULT_PREFIX_LENGTH,
            max_files_in_cache: DEFAULT_MAX_FILES_IN_CACHE,
            max_selectors_in_cache: DEFAULT_MAX_SELECTORS_IN_CACHE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub eviction: EvictionMode,
    pub sweep_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            eviction: EvictionMode::Insert,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    pub fn eviction_policy(&self) -> EvictionPolicy {
        match self.cache.eviction {
            EvictionMode::Insert => EvictionPolicy::OnInsert,
            EvictionMode::Interval => {
                EvictionPolicy::Interval(Duration::from_millis(self.cache.sweep_interval_ms))
            }
        }
    }

    /// Configured database path, else the default under the data directory
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .or_else(default_database_path)
            .unwrap_or_else(|| PathBuf::from("signatures"))
    }

    pub fn decoder_options(&self) -> DecoderOptions {
        DecoderOptions {
            path: self.database_path(),
            prefix_length: self.database.prefix_length,
            max_files_in_cache: self.database.max_files_in_cache,
            max_selectors_in_cache: self.database.max_selectors_in_cache,
            eviction: self.eviction_policy(),
        }
    }
}

/// Parse configuration from TOML text
pub fn parse(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(content)
}

/// Load the configuration file, falling back to defaults when it is missing or invalid
pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    match parse(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring invalid config file");
            Config::default()
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("REVERT_DECODER_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("revert-decoder").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("revert-decoder").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "revert-decoder", "revert-decoder")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("revert-decoder"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("revert-decoder"));
    }
    directories::ProjectDirs::from("io", "revert-decoder", "revert-decoder")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn default_database_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("signatures"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.database.backend, Backend::Files);
        assert_eq!(config.database.prefix_length, 2);
        assert_eq!(config.database.max_files_in_cache, 2);
        assert_eq!(config.database.max_selectors_in_cache, 1000);
        assert_eq!(config.eviction_policy(), EvictionPolicy::OnInsert);
    }

    #[test]
    fn test_parse_full() {
        let config = parse(
            r#"
            [database]
            path = "/var/lib/signatures"
            backend = "sqlite"
            prefix_length = 3
            max_files_in_cache = 16

            [cache]
            eviction = "interval"
            sweep_interval_ms = 500
            "#,
        )
        .unwrap();

        let options = config.decoder_options();
        assert_eq!(config.database.backend, Backend::Sqlite);
        assert_eq!(options.path, PathBuf::from("/var/lib/signatures"));
        assert_eq!(options.prefix_length, 3);
        assert_eq!(options.max_files_in_cache, 16);
        assert_eq!(options.max_selectors_in_cache, 1000);
        assert_eq!(options.eviction, EvictionPolicy::Interval(Duration::from_millis(500)));
    }

    #[test]
    fn test_rejects_unknown_backend() {
        assert!(parse("[database]\nbackend = \"redis\"").is_err());
    }
}
