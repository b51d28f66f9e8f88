//! Configuration
//!
//! Centralized configuration with runtime defaults, an optional TOML file,
//! environment variable overrides, and validation. A global instance is
//! initialized once and shared.

use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub api: ApiConfig,
    pub timezone: TimezoneConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Spotify Web API base, overridable for tests and proxies.
    pub base_url: String,
    /// Page size for the recently-played endpoint (API maximum is 50).
    pub page_limit: u32,
    /// Environment variable holding the pre-authorized bearer token.
    pub token_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimezoneConfig {
    /// Fixed reference offset of the user's locale, in hours east of UTC.
    pub utc_offset_hours: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub log_directory: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            api: ApiConfig::default(),
            timezone: TimezoneConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.spotify.com/v1".to_string(),
            page_limit: 50,
            token_env: "SPOTIFY_ACCESS_TOKEN".to_string(),
        }
    }
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        // America/Sao_Paulo as a fixed offset.
        Self { utc_offset_hours: -3 }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            log_directory: PathBuf::from("logs"),
        }
    }
}

impl TimezoneConfig {
    pub fn fixed_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .context("utc_offset_hours is out of range")
    }
}

impl Config {
    /// Load configuration from file (if present), environment, and defaults.
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        let config_paths = [
            PathBuf::from("spotify-stats.toml"),
            PathBuf::from(".spotify-stats.toml"),
            dirs::config_dir()
                .map(|dir| dir.join("spotify-stats").join("config.toml"))
                .unwrap_or_default(),
        ];
        for path in &config_paths {
            if path.exists() {
                info!(config_file = %path.display(), "loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        if let Ok(val) = env::var("SPOTIFY_STATS_API_BASE") {
            self.api.base_url = val;
        }
        if let Ok(val) = env::var("SPOTIFY_STATS_PAGE_LIMIT") {
            self.api.page_limit = val.parse().context("invalid SPOTIFY_STATS_PAGE_LIMIT")?;
        }
        if let Ok(val) = env::var("SPOTIFY_STATS_UTC_OFFSET_HOURS") {
            self.timezone.utc_offset_hours = val
                .parse()
                .context("invalid SPOTIFY_STATS_UTC_OFFSET_HOURS")?;
        }
        if let Ok(val) = env::var("SPOTIFY_STATS_DATA_DIR") {
            self.paths.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = env::var("SPOTIFY_STATS_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.page_limit == 0 || self.api.page_limit > 50 {
            anyhow::bail!(
                "page_limit must be between 1 and 50, got {}",
                self.api.page_limit
            );
        }
        if !(-12..=14).contains(&self.timezone.utc_offset_hours) {
            anyhow::bail!(
                "utc_offset_hours must be between -12 and 14, got {}",
                self.timezone.utc_offset_hours
            );
        }
        if self.api.base_url.is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }

        if self.logging.output != "console" && !self.paths.log_directory.exists() {
            fs::create_dir_all(&self.paths.log_directory)
                .context("failed to create log directory")?;
        }

        Ok(())
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration instance.
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(|| {
        Config::load().unwrap_or_else(|err| {
            eprintln!("invalid configuration: {err:#}");
            std::process::exit(1)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.api.page_limit, 50);
        assert_eq!(config.timezone.utc_offset_hours, -3);
        assert_eq!(config.paths.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn env_override_applies() {
        env::set_var("SPOTIFY_STATS_PAGE_LIMIT", "25");
        let mut config = Config::default();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.api.page_limit, 25);
        env::remove_var("SPOTIFY_STATS_PAGE_LIMIT");
    }

    #[test]
    fn page_limit_is_validated() {
        let mut config = Config::default();
        config.api.page_limit = 0;
        assert!(config.validate().is_err());
        config.api.page_limit = 51;
        assert!(config.validate().is_err());
    }

    #[test]
    fn offset_out_of_range_is_rejected() {
        let mut config = Config::default();
        config.timezone.utc_offset_hours = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_config_file_fills_defaults() {
        let config: Config = toml::from_str("[timezone]\nutc_offset_hours = 2\n").unwrap();
        assert_eq!(config.timezone.utc_offset_hours, 2);
        assert_eq!(config.api.page_limit, 50);
    }

    #[test]
    fn fixed_offset_matches_hours() {
        let tz = TimezoneConfig { utc_offset_hours: -3 };
        assert_eq!(tz.fixed_offset().unwrap().local_minus_utc(), -3 * 3600);
    }
}
