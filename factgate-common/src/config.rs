//! Configuration loading and resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument / environment variable (collected by the binary
//!    into [`ConfigOverrides`], highest priority)
//! 2. TOML config file
//! 3. Compiled default (fallback)

use crate::{Error, Result};
use std::path::PathBuf;

/// Default listen host
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default listen port
pub const DEFAULT_PORT: u16 = 5820;
/// Default correction-source (search engine) base URL
pub const DEFAULT_CORRECTION_URL: &str = "http://127.0.0.1:9200";
/// Default correction-source index name
pub const DEFAULT_CORRECTION_INDEX: &str = "ingredients";
/// Default minimum confidence for spellcheck suggestions
pub const DEFAULT_MIN_CONFIDENCE: f64 = 1.0;

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HTTP listen host
    pub host: String,
    /// HTTP listen port
    pub port: u16,
    /// SQLite database file path
    pub database_path: PathBuf,
    /// Correction-source base URL
    pub correction_url: String,
    /// Correction-source index queried for suggestions
    pub correction_index: String,
    /// Fact-sink base URL; propagation is disabled when unset
    pub fact_sink_url: Option<String>,
    /// Minimum suggestion confidence used when a request does not set one
    pub spellcheck_min_confidence: f64,
}

/// Settings collected from the command line and environment by the binary
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub correction_url: Option<String>,
    pub correction_index: Option<String>,
    pub fact_sink_url: Option<String>,
    pub spellcheck_min_confidence: Option<f64>,
}

impl ServiceConfig {
    /// Resolve the full configuration from overrides, config file, defaults
    pub fn resolve(overrides: ConfigOverrides) -> Self {
        let file = load_config_file()
            .ok()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|content| toml::from_str::<toml::Value>(&content).ok());

        Self::merge(overrides, file)
    }

    fn merge(overrides: ConfigOverrides, file: Option<toml::Value>) -> Self {
        let file_str = |key: &str| -> Option<String> {
            file.as_ref()
                .and_then(|f| f.get(key))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let file_int = |key: &str| -> Option<i64> {
            file.as_ref().and_then(|f| f.get(key)).and_then(|v| v.as_integer())
        };
        let file_float = |key: &str| -> Option<f64> {
            file.as_ref().and_then(|f| f.get(key)).and_then(|v| v.as_float())
        };

        Self {
            host: overrides
                .host
                .or_else(|| file_str("host"))
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides
                .port
                .or_else(|| file_int("port").map(|p| p as u16))
                .unwrap_or(DEFAULT_PORT),
            database_path: overrides
                .database_path
                .or_else(|| file_str("database_path").map(PathBuf::from))
                .unwrap_or_else(default_database_path),
            correction_url: overrides
                .correction_url
                .or_else(|| file_str("correction_url"))
                .unwrap_or_else(|| DEFAULT_CORRECTION_URL.to_string()),
            correction_index: overrides
                .correction_index
                .or_else(|| file_str("correction_index"))
                .unwrap_or_else(|| DEFAULT_CORRECTION_INDEX.to_string()),
            fact_sink_url: overrides.fact_sink_url.or_else(|| file_str("fact_sink_url")),
            spellcheck_min_confidence: overrides
                .spellcheck_min_confidence
                .or_else(|| file_float("spellcheck_min_confidence"))
                .unwrap_or(DEFAULT_MIN_CONFIDENCE),
        }
    }
}

/// Locate the configuration file for the platform
fn load_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/factgate/config.toml first, then /etc/factgate/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("factgate").join("config.toml"));
        let system_config = PathBuf::from("/etc/factgate/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("factgate").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("factgate"))
        .unwrap_or_else(|| PathBuf::from("/var/lib/factgate"))
        .join("factgate.db")
}
