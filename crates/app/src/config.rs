//! Client configuration
//!
//! Read from `$MOYEORA_CONFIG` or `config.toml` in the platform config
//! directory. A missing file means defaults everywhere.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use moyeora_core::roulette::SpinTiming;
use moyeora_net::DEFAULT_PORT;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, Result};

pub const CONFIG_ENV: &str = "MOYEORA_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub local: LocalConfig,
    pub feed: FeedConfig,
    pub geocoder: GeocoderConfig,
    pub device: DeviceConfig,
    pub share: ShareConfig,
    pub roulette: RouletteConfig,
}

/// Shared room/participant database
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
}

/// Client-local key/value store
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub addr: SocketAddr,
    pub enabled: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub endpoint: String,
    /// Appended to every query to keep matches in one country
    pub region_suffix: String,
    pub language: String,
    pub user_agent: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org/search".to_string(),
            region_suffix: "대한민국".to_string(),
            language: "ko".to_string(),
            user_agent: concat!("moyeora/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Fixed device position; terminals have no GPS of their own
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    pub base_url: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            base_url: "https://moyeora.app".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouletteConfig {
    pub base_delay_ms: u64,
    pub slowdown_ms: u64,
}

impl Default for RouletteConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 60,
            slowdown_ms: 12,
        }
    }
}

impl RouletteConfig {
    pub fn timing(&self) -> SpinTiming {
        SpinTiming {
            base_delay: Duration::from_millis(self.base_delay_ms),
            slowdown: Duration::from_millis(self.slowdown_ms),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("app", "moyeora", "moyeora")
        .ok_or_else(|| AppError::Config("Could not determine home directory".into()))
}

impl Config {
    /// Load from the environment-selected or default location
    pub fn load() -> Result<Self> {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(path) => PathBuf::from(path),
            None => project_dirs()?.config_dir().join("config.toml"),
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store.path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("moyeora.db")),
        }
    }

    pub fn local_path(&self) -> Result<PathBuf> {
        match &self.local.path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("local.db")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.feed.addr.port(), 7341);
        assert!(config.feed.enabled);
        assert_eq!(config.geocoder.region_suffix, "대한민국");
        assert_eq!(config.share.base_url, "https://moyeora.app");
        assert_eq!(config.roulette.timing(), SpinTiming::default());
    }

    #[test]
    fn test_partial_file() {
        let config = Config::parse(
            r#"
[store]
path = "/tmp/rooms.db"

[feed]
addr = "10.0.0.5:9000"

[device]
latitude = 37.5665
longitude = 126.978

[roulette]
base_delay_ms = 0
"#,
        )
        .unwrap();

        assert_eq!(config.store_path().unwrap(), PathBuf::from("/tmp/rooms.db"));
        assert_eq!(config.feed.addr, "10.0.0.5:9000".parse::<SocketAddr>().unwrap());
        assert!(config.feed.enabled);
        assert_eq!(config.device.latitude, Some(37.5665));
        assert_eq!(config.roulette.base_delay_ms, 0);
        assert_eq!(config.roulette.slowdown_ms, 12);
        assert_eq!(config.geocoder.language, "ko");
    }

    #[test]
    fn test_bad_file() {
        let err = Config::parse("[feed]\naddr = 5").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(config.store.path.is_none());
    }
}
