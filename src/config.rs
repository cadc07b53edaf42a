//! Configuration file support for UPCAT.
//!
//! Settings are read from a JSON file. The host platform passes the team and
//! task ids through the environment, which override the file values.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::model::{TaskId, TeamId, UserId};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Team owning the reference files and the annotators
    #[serde(default)]
    pub team_id: TeamId,

    /// Task id of the running application (target of UI field updates)
    #[serde(default)]
    pub task_id: TaskId,

    /// Reference input locations
    #[serde(default)]
    pub inputs: InputConfig,

    /// Tag, class and UI settings
    #[serde(default)]
    pub tagging: TaggingConfig,

    /// Static membership table for offline runs
    #[serde(default)]
    pub members: MembersConfig,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Where the reference inputs live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Remote team directory
    #[serde(default = "default_remote_dir")]
    pub remote_dir: String,

    /// Local download directory; defaults to the user data directory
    #[serde(default)]
    pub local_dir: Option<PathBuf>,

    /// UPC -> URL list file name
    #[serde(default = "default_upc_urls")]
    pub upc_urls: String,

    /// Batch -> UPC list file name
    #[serde(default = "default_upc_batches")]
    pub upc_batches: String,

    /// User -> batch list file name
    #[serde(default = "default_user_batches")]
    pub user_batches: String,

    /// Catalog table file name (`.csv` or `.json`)
    #[serde(default = "default_catalog")]
    pub catalog: String,
}

fn default_remote_dir() -> String {
    constants::REMOTE_DIRECTORY.to_string()
}

fn default_upc_urls() -> String {
    constants::FILE_UPC_URLS.to_string()
}

fn default_upc_batches() -> String {
    constants::FILE_UPC_BATCHES.to_string()
}

fn default_user_batches() -> String {
    constants::FILE_USER_BATCHES.to_string()
}

fn default_catalog() -> String {
    constants::FILE_CATALOG.to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            remote_dir: default_remote_dir(),
            local_dir: None,
            upc_urls: default_upc_urls(),
            upc_batches: default_upc_batches(),
            user_batches: default_user_batches(),
            catalog: default_catalog(),
        }
    }
}

impl InputConfig {
    /// All input file names, in download order.
    pub fn file_names(&self) -> [&str; 4] {
        [
            self.upc_urls.as_str(),
            self.upc_batches.as_str(),
            self.user_batches.as_str(),
            self.catalog.as_str(),
        ]
    }

    /// Remote path of an input file.
    pub fn remote_path(&self, file_name: &str) -> String {
        format!("{}/{}", self.remote_dir.trim_end_matches('/'), file_name)
    }

    /// Resolved local download directory.
    pub fn local_dir(&self) -> PathBuf {
        if let Some(dir) = &self.local_dir {
            return dir.clone();
        }
        let base = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        base.join("upcat").join(self.remote_dir.trim_start_matches('/'))
    }
}

/// Names used by navigation and tagging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggingConfig {
    /// Object class walked by prev/next navigation
    #[serde(default = "default_product_class")]
    pub product_class: String,

    /// String tag receiving the UPC code
    #[serde(default = "default_upc_tag")]
    pub upc_tag: String,

    /// Marker tag for erroneous labels
    #[serde(default = "default_error_tag")]
    pub error_tag: String,

    /// Catalog column holding the UPC code
    #[serde(default = "default_upc_column")]
    pub catalog_upc_column: String,

    /// Substring marking full-size reference images
    #[serde(default = "default_full_marker")]
    pub full_marker: String,

    /// Zoom factor when focusing a label
    #[serde(default = "default_zoom_scale")]
    pub zoom_scale: f64,
}

fn default_product_class() -> String {
    constants::PRODUCT_CLASS_NAME.to_string()
}

fn default_upc_tag() -> String {
    constants::UPC_TAG_NAME.to_string()
}

fn default_error_tag() -> String {
    constants::ERROR_TAG_NAME.to_string()
}

fn default_upc_column() -> String {
    constants::CATALOG_UPC_COLUMN.to_string()
}

fn default_full_marker() -> String {
    constants::FULL_SIZE_MARKER.to_string()
}

fn default_zoom_scale() -> f64 {
    constants::DEFAULT_ZOOM_SCALE
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            product_class: default_product_class(),
            upc_tag: default_upc_tag(),
            error_tag: default_error_tag(),
            catalog_upc_column: default_upc_column(),
            full_marker: default_full_marker(),
            zoom_scale: default_zoom_scale(),
        }
    }
}

/// Membership table used when no platform membership service is available.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MembersConfig {
    /// Team display name
    #[serde(default)]
    pub team_name: String,

    /// Login -> user id
    #[serde(default)]
    pub logins: BTreeMap<String, UserId>,
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            team_id: 0,
            task_id: 0,
            inputs: InputConfig::default(),
            tagging: TaggingConfig::default(),
            members: MembersConfig::default(),
            log_level: LogLevel::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Apply `TEAM_ID` / `TASK_ID` from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply environment overrides from an arbitrary lookup.
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(team_id) = parse_env_id(&lookup, "TEAM_ID")? {
            self.team_id = team_id;
        }
        if let Some(task_id) = parse_env_id(&lookup, "TASK_ID")? {
            self.task_id = task_id;
        }
        Ok(())
    }
}

fn parse_env_id(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidEnv { name, value: raw })
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Environment variable holds something other than an id
    #[error("Environment variable {name} is not a valid id: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}
