//! Configuration management for Tributary.
//!
//! Configuration is read from `~/.config/tributary/config.toml`.
//! If the file doesn't exist, a default configuration with comments is created.

pub mod instances;

pub use instances::StaticLists;

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub youtube: YoutubeConfig,
    pub github: GithubConfig,
}

/// Network settings shared by every adapter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Timeout for feed and API requests in milliseconds (default: 5000)
    pub timeout_ms: u64,
    /// Timeout for fetching the page a favicon is searched on (default: 3000)
    pub favicon_timeout_ms: u64,
    /// Timeout for probing a single favicon candidate (default: 1000)
    pub probe_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            favicon_timeout_ms: 3000,
            probe_timeout_ms: 1000,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn favicon_timeout(&self) -> Duration {
        Duration::from_millis(self.favicon_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// YouTube Data API key. Without it channel icons are not looked up.
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
        }
    }
}

impl Config {
    /// Load `~/.config/tributary/config.toml`, writing a commented default
    /// file on first run.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::from_path(&config_path)
    }

    /// Load configuration from an explicit file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(io_error(path))?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("tributary").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        fs::File::create(path)
            .and_then(|mut file| file.write_all(Self::default_config_content().as_bytes()))
            .map_err(io_error(path))
    }

    fn default_config_content() -> &'static str {
        r##"# Tributary Configuration

[fetch]
# Timeout for feed and API requests (milliseconds)
timeout_ms = 5000

# Timeout for loading the page a favicon is searched on (milliseconds)
favicon_timeout_ms = 3000

# Timeout for probing each favicon candidate (milliseconds)
probe_timeout_ms = 1000

[youtube]
# YouTube Data API key used to look up channel icons.
# api_key = "..."

[github]
api_url = "https://api.github.com"
"##
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError + '_ {
    move |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
