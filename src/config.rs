use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::filter::ContentPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub site: SiteConfig,

    pub ingest: IngestConfig,

    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/anisheet.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Catalog site every relative sheet path is resolved against.
    pub base_url: String,

    pub user_agent: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.anime-kun.net".to_string(),
            user_agent: "anisheet/1.0".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// How many sheets may be fetched at once (default: 3). Kept small to
    /// stay polite with the source site.
    pub fetch_concurrency: usize,

    /// Whether ingest also refreshes the seasonal and daily planning
    /// snapshot tables.
    pub planning_snapshots: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: 3,
            planning_snapshots: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Keep and show titles flagged adult (default: false).
    pub allow_adult: bool,

    /// Keep and show titles flagged explicit (default: false).
    pub allow_explicit: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::default_config_path();
        self.save_to_path(&path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("anisheet").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".anisheet").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.is_empty() {
            anyhow::bail!("Database path cannot be empty");
        }

        if url::Url::parse(&self.site.base_url).is_err() {
            anyhow::bail!("Site base_url must be an absolute URL: {}", self.site.base_url);
        }

        if self.ingest.fetch_concurrency == 0 {
            anyhow::bail!("Ingest fetch_concurrency must be > 0");
        }

        if self.general.max_db_connections == 0
            || self.general.max_db_connections < self.general.min_db_connections
        {
            anyhow::bail!("Database pool sizes must satisfy 0 < min <= max");
        }

        Ok(())
    }

    /// The process-wide visibility default, overridable per call.
    #[must_use]
    pub const fn content_policy(&self) -> ContentPolicy {
        ContentPolicy {
            allow_adult: self.policy.allow_adult,
            allow_explicit: self.policy.allow_explicit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.database_path, "sqlite:data/anisheet.db");
        assert_eq!(config.ingest.fetch_concurrency, 3);
        assert!(config.ingest.planning_snapshots);
        assert!(!config.policy.allow_adult);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[site]"));
        assert!(toml_str.contains("[ingest]"));
        assert!(toml_str.contains("[policy]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [ingest]
            fetch_concurrency = 1

            [policy]
            allow_adult = true
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.ingest.fetch_concurrency, 1);
        assert!(config.policy.allow_adult);

        assert_eq!(config.site.base_url, "https://www.anime-kun.net");
        assert_eq!(
            config.content_policy(),
            ContentPolicy {
                allow_adult: true,
                allow_explicit: false
            }
        );
    }

    #[test]
    fn test_validation_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.ingest.fetch_concurrency = 0;
        assert!(config.validate().is_err());
    }
}
