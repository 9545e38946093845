//! Configuration management for paperdesk
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use crate::source::ContextSource;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Retrieval/generation backend
    #[serde(default)]
    pub backend: BackendConfig,

    /// Upload ingestion
    #[serde(default)]
    pub ingest: IngestConfig,

    /// User-facing notifications
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Session defaults
    #[serde(default)]
    pub session: SessionConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend service
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Request timeout in seconds (unset = wait indefinitely)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: Option<u64>,
}

/// Upload ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Filename extensions identifying the supported format (without the dot)
    #[serde(default = "default_accepted_extensions")]
    pub accepted_extensions: Vec<String>,

    /// Media types identifying the supported format
    #[serde(default = "default_accepted_media_types")]
    pub accepted_media_types: Vec<String>,

    /// Maximum characters of a file name shown in notifications
    #[serde(default = "default_max_display_name_chars")]
    pub max_display_name_chars: usize,

    /// Delay before a completed upload entry is removed (milliseconds)
    #[serde(default = "default_progress_clear_delay_ms")]
    pub progress_clear_delay_ms: u64,

    /// Bytes read per chunk while loading a file
    #[serde(default = "default_read_chunk_bytes")]
    pub read_chunk_bytes: usize,
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// How long a notification stays visible (milliseconds)
    #[serde(default = "default_notification_duration_ms")]
    pub duration_ms: u64,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Context source active when a session starts
    #[serde(default = "default_context_source")]
    pub default_source: ContextSource,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for paperdesk data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            accepted_extensions: default_accepted_extensions(),
            accepted_media_types: default_accepted_media_types(),
            max_display_name_chars: default_max_display_name_chars(),
            progress_clear_delay_ms: default_progress_clear_delay_ms(),
            read_chunk_bytes: default_read_chunk_bytes(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_notification_duration_ms(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_source: default_context_source(),
        }
    }
}

impl BackendConfig {
    /// Request timeout, if one is configured
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl IngestConfig {
    pub fn progress_clear_delay(&self) -> Duration {
        Duration::from_millis(self.progress_clear_delay_ms)
    }
}

impl NotificationConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Config {
    /// Get the default base directory for paperdesk (~/.paperdesk)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".paperdesk")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    pub(crate) fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.backend.url)
            .map_err(|e| Error::Config(format!("backend.url is not a valid URL: {}", e)))?;

        if self.backend.request_timeout_secs == Some(0) {
            return Err(Error::Config(
                "backend.request_timeout_secs must be positive when set".to_string(),
            ));
        }

        if self.ingest.accepted_extensions.is_empty() && self.ingest.accepted_media_types.is_empty()
        {
            return Err(Error::Config(
                "ingest needs at least one accepted extension or media type".to_string(),
            ));
        }

        if self.ingest.max_display_name_chars == 0 {
            return Err(Error::Config(
                "ingest.max_display_name_chars must be positive".to_string(),
            ));
        }

        if self.ingest.read_chunk_bytes == 0 {
            return Err(Error::Config(
                "ingest.read_chunk_bytes must be positive".to_string(),
            ));
        }

        if self.notifications.duration_ms == 0 {
            return Err(Error::Config(
                "notifications.duration_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
