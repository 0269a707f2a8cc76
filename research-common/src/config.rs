//! Configuration loading and data folder resolution
//!
//! Settings sources, highest priority first:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default
//!
//! A missing or unparsable TOML file never stops startup: it is logged and
//! the compiled defaults are used instead.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming the data folder
pub const DATA_FOLDER_ENV: &str = "RESEARCH_DATA_FOLDER";

/// Environment variable naming an explicit TOML config file
pub const CONFIG_PATH_ENV: &str = "RESEARCH_CONFIG";

/// Environment variable carrying the deployment label (health endpoint)
pub const ENVIRONMENT_ENV: &str = "ENVIRONMENT";

/// Database file name inside the data folder
pub const DATABASE_FILE_NAME: &str = "research.db";

/// Directory name used under the OS config/data directories
const APP_DIR_NAME: &str = "research-platform";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding the SQLite database
    pub data_folder: Option<PathBuf>,

    /// HTTP server settings
    pub api: ApiConfig,

    /// Task worker settings
    pub worker: WorkerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Task worker settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Maximum number of tasks executing at once
    pub concurrency: usize,

    /// Sleep between broker polls when the queue is empty
    pub poll_interval_ms: u64,

    /// Simulated processing time of `process_document`
    pub process_document_delay_ms: u64,

    /// Simulated processing time of `ai_analysis_task`
    pub ai_analysis_delay_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            poll_interval_ms: 500,
            process_document_delay_ms: 2000,
            ai_analysis_delay_ms: 3000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when RUST_LOG is not set (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load the TOML config from `RESEARCH_CONFIG` or the platform config
    /// directory, falling back to defaults when absent or invalid
    pub fn load_or_default() -> Self {
        let path = match std::env::var(CONFIG_PATH_ENV) {
            Ok(p) => PathBuf::from(p),
            Err(_) => match default_config_path() {
                Some(p) => p,
                None => {
                    debug!("No config directory on this platform, using defaults");
                    return Self::default();
                }
            },
        };

        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{} - continuing with defaults", e);
                Self::default()
            }
        }
    }
}

/// Platform config file location (`<config dir>/research-platform/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// OS-dependent default data folder
pub fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\research-platform"))
    } else {
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("./research_data"))
    }
}

/// Resolve the data folder following the priority order above
pub fn resolve_data_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATA_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.data_folder {
        return path.clone();
    }

    default_data_folder()
}

/// Create the data folder if missing and return the database path inside it
pub fn prepare_data_folder(data_folder: &Path) -> Result<PathBuf> {
    if !data_folder.exists() {
        std::fs::create_dir_all(data_folder)?;
        info!("Created data folder: {}", data_folder.display());
    }
    Ok(data_folder.join(DATABASE_FILE_NAME))
}

/// Deployment label reported by the health endpoint
pub fn environment_label() -> String {
    std::env::var(ENVIRONMENT_ENV).unwrap_or_else(|_| "development".to_string())
}
