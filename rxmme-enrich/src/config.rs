//! Configuration resolution for rxmme-enrich
//!
//! Every setting resolves with the same priority: command line → environment
//! → TOML file → built-in default.

use clap::Parser;
use rxmme_common::config::{
    resolve_root_folder, RxNavSettings, TomlConfig, CONFIG_ENV_VAR, ROOT_FOLDER_ENV_VAR,
};
use std::path::PathBuf;
use tracing::info;

/// Environment variable overriding the RxNav base URL
pub const BASE_URL_ENV_VAR: &str = "RXMME_RXNAV_BASE_URL";

/// Cache database file name inside the root folder
pub const DEFAULT_CACHE_FILE: &str = "rxnorm_cache.db";

/// Output table path when none is configured
pub const DEFAULT_OUTPUT_FILE: &str = "rxnorm_drugs.csv";

/// Log filter used until the TOML config has been read
pub const STARTUP_LOG_LEVEL: &str = "info";

/// Command-line arguments for rxmme-enrich
#[derive(Parser, Debug, Clone)]
#[command(name = "rxmme-enrich")]
#[command(about = "Enrich NDC product codes via RxNav and compute MME")]
#[command(version)]
pub struct Args {
    /// File with one NDC per line
    #[arg(short, long)]
    pub input: PathBuf,

    /// Result cache database (default: <root>/rxnorm_cache.db)
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Output CSV table (default: rxnorm_drugs.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Root folder for the cache database
    #[arg(short, long)]
    pub root_folder: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    pub config: Option<PathBuf>,

    /// RxNav REST base URL
    #[arg(long, env = BASE_URL_ENV_VAR)]
    pub base_url: Option<String>,

    /// Log level or filter directive (overridden by RUST_LOG)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Log filter to install before configuration is loaded
    ///
    /// The command-line level wins; otherwise the default until
    /// [`EnrichConfig::resolve`] yields the TOML level.
    pub fn startup_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(STARTUP_LOG_LEVEL)
    }
}

/// Fully resolved run settings
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichConfig {
    pub input_path: PathBuf,
    pub root_folder: PathBuf,
    pub cache_path: PathBuf,
    pub output_path: PathBuf,
    pub rxnav: RxNavSettings,
    pub log_level: String,
}

impl EnrichConfig {
    /// Merge command-line arguments over the TOML config
    pub fn resolve(args: &Args, toml_config: &TomlConfig) -> Self {
        let root_folder =
            resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV_VAR, toml_config);

        let cache_path = args
            .cache
            .clone()
            .or_else(|| toml_config.cache_path.clone())
            .unwrap_or_else(|| root_folder.join(DEFAULT_CACHE_FILE));

        let output_path = args
            .output
            .clone()
            .or_else(|| toml_config.output_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));

        let mut rxnav = toml_config.rxnav.clone();
        if let Some(url) = args.base_url.as_ref().filter(|u| !u.trim().is_empty()) {
            info!("RxNav base URL overridden: {}", url);
            rxnav.base_url = url.clone();
        }

        let log_level = args
            .log_level
            .clone()
            .unwrap_or_else(|| toml_config.logging.level.clone());

        Self {
            input_path: args.input.clone(),
            root_folder,
            cache_path,
            output_path,
            rxnav,
            log_level,
        }
    }
}
