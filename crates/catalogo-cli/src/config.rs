//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global configuration shared by both tools
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub diff: DiffConfig,
    pub qbittorrent: QbittorrentConfig,
    pub http: HttpConfig,
    /// File the configuration came from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Languages kept when `--languages` is not given (empty: all)
    pub default_languages: Vec<String>,
    /// Directory for the timestamped output and log files
    pub output_dir: PathBuf,
    /// Rows between progress lines
    pub progress_every: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            default_languages: Vec::new(),
            output_dir: PathBuf::from("."),
            progress_every: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QbittorrentConfig {
    pub url: String,
    pub username: String,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub password: Option<String>,
    pub batch_size: usize,
    pub delay_secs: u64,
    pub batch_delay_secs: u64,
    /// Batches between long pauses
    pub long_pause_every: usize,
}

impl Default for QbittorrentConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            username: "admin".to_string(),
            password: Some("adminadmin".to_string()),
            batch_size: 400,
            delay_secs: 2,
            batch_delay_secs: 5,
            long_pause_every: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            request_timeout_secs: 60,
        }
    }
}

impl HttpConfig {
    pub fn to_core(self) -> catalogo_core::HttpConfig {
        catalogo_core::HttpConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from `explicit`, or from default locations
    ///
    /// Search order:
    /// 1. ./catalogo.toml (current directory)
    /// 2. ~/.config/catalogo/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local_config = PathBuf::from("catalogo.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "catalogo") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Log where settings came from (call once logging is up)
    pub fn log_source(&self) {
        match &self.source {
            Some(path) => log::info!("Loaded config from {}", path.display()),
            None => log::debug!("No config file found, using defaults"),
        }
    }
}
