use crate::engine::ResourceType;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub lists: ListConfig,

    #[serde(default)]
    pub rules: RuleConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub stats: StatsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListConfig {
    /// Named static tracker list sources: local file paths or http(s) URLs.
    #[serde(default)]
    pub sources: HashMap<String, String>,
    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuleConfig {
    #[serde(default = "default_resource_types")]
    pub resource_types: Vec<ResourceType>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_blocked")]
    pub log_blocked: bool,
    #[serde(default)]
    pub log_decisions: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatsConfig {
    #[serde(default = "default_stats_enable")]
    pub enable: bool,
    #[serde(default = "default_stats_interval")]
    pub log_interval_seconds: u64,
}

// Defaults
fn default_api_host() -> String {
    "127.0.0.1".to_string()
}
fn default_api_port() -> u16 {
    8720
}
fn default_concurrent_downloads() -> usize {
    4
}
fn default_resource_types() -> Vec<ResourceType> {
    ResourceType::default_scope()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_blocked() -> bool {
    true
}
fn default_storage_backend() -> String {
    "memory".to_string()
}
fn default_sqlite_path() -> String {
    "trackstop.db".to_string()
}
fn default_stats_enable() -> bool {
    true
}
fn default_stats_interval() -> u64 {
    300
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            sources: HashMap::new(),
            concurrent_downloads: default_concurrent_downloads(),
        }
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            resource_types: default_resource_types(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_blocked: default_log_blocked(),
            log_decisions: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            enable: default_stats_enable(),
            log_interval_seconds: default_stats_interval(),
        }
    }
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config TOML")?;
        Ok(config)
    }

    /// Sources sorted by name for deterministic ordering across runs.
    pub fn get_sources_sorted(&self) -> Vec<(String, String)> {
        let mut list: Vec<_> = self
            .lists
            .sources
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        list.sort_by(|a, b| a.0.cmp(&b.0));
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.api.port, 8720);
        assert_eq!(config.storage.backend, "memory");
        assert!(config.lists.sources.is_empty());
        assert!(config.logging.log_blocked);
        assert_eq!(config.rules.resource_types, ResourceType::default_scope());
    }

    #[test]
    fn test_partial_section_keeps_field_defaults() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            backend = "sqlite"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.backend, "sqlite");
        assert_eq!(config.storage.sqlite_path, "trackstop.db");
    }
}
