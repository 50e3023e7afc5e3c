//! Configuration loading and root folder resolution
//!
//! Settings are layered with the following priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing TOML file is not an error: a warning is logged and the
//! built-in defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "RXMME_CONFIG";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV_VAR: &str = "RXMME_ROOT_FOLDER";

/// Default RxNav REST endpoint
pub const DEFAULT_RXNAV_BASE_URL: &str = "https://rxnav.nlm.nih.gov/REST";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Folder holding the result cache database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Terminology service settings (optional)
    #[serde(default)]
    pub rxnav: RxNavSettings,

    /// Explicit result cache database path, overrides `<root_folder>/rxnorm_cache.db`
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// Output CSV path
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// RxNav transport settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RxNavSettings {
    /// REST base URL, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum interval between two requests in milliseconds
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// Total time budget for retrying one transient failure, in milliseconds
    #[serde(default = "default_max_retry_wait_ms")]
    pub max_retry_wait_ms: u64,
}

impl Default for RxNavSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            rate_limit_ms: default_rate_limit_ms(),
            max_retry_wait_ms: default_max_retry_wait_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    DEFAULT_RXNAV_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_rate_limit_ms() -> u64 {
    50 // RxNav asks for at most 20 requests per second
}

fn default_max_retry_wait_ms() -> u64 {
    10_000
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Locate and load the TOML config, falling back to defaults
///
/// An explicit path (from the command line or `RXMME_CONFIG`) must exist and
/// parse. The platform default location is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return load_toml_config(path);
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return load_toml_config(Path::new(&path));
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            debug!("Loading config from {}", path.display());
            load_toml_config(&path)
        }
        Some(path) => {
            warn!(
                "Config file not found at {}, using built-in defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            warn!("Could not determine config directory, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Default config file path for the platform (`<config_dir>/rxmme/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rxmme").join("config.toml"))
}

/// Resolve the root folder following CLI → ENV → TOML → default priority
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/rxmme (or /var/lib/rxmme for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("rxmme"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/rxmme"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/rxmme
        dirs::data_dir()
            .map(|d| d.join("rxmme"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/rxmme"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\rxmme
        dirs::data_local_dir()
            .map(|d| d.join("rxmme"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\rxmme"))
    } else {
        PathBuf::from("./rxmme_data")
    }
}

/// Create the root folder if missing
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        debug!("Created root folder {}", path.display());
    }
    Ok(())
}
