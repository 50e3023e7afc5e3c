//! rxmme-enrich - NDC enrichment and MME calculation
//!
//! Reads a list of NDC product codes, enriches each through RxNav, and writes
//! the accumulated result table. Progress is cached in SQLite so an aborted
//! or interrupted run resumes on the next invocation.

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use rxmme_enrich::config::{Args, EnrichConfig};
use rxmme_enrich::db::{self, SqliteRecordCache};
use rxmme_enrich::services::{read_ndc_list, BatchRunner, Enricher, RxNavClient};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize tracing before loading config so its warnings are visible
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter_layer, filter_handle) = reload::Layer::new(
        env_filter.unwrap_or_else(|| args.startup_log_level().into()),
    );
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let toml_config = rxmme_common::config::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;
    let config = EnrichConfig::resolve(&args, &toml_config);

    // RUST_LOG and --log-level are final; otherwise switch to the TOML level
    if !from_env && config.log_level != args.startup_log_level() {
        if let Err(e) = filter_handle.reload(config.log_level.as_str()) {
            warn!("Failed to apply log level {}: {}", config.log_level, e);
        }
    }

    info!("Starting rxmme-enrich {}", env!("CARGO_PKG_VERSION"));
    info!("Input: {}", config.input_path.display());
    info!("Cache: {}", config.cache_path.display());
    info!("Output: {}", config.output_path.display());
    info!("RxNav: {}", config.rxnav.base_url);

    let ndcs = read_ndc_list(&config.input_path)
        .with_context(|| format!("Failed to read {}", config.input_path.display()))?;

    rxmme_common::config::ensure_directory_exists(&config.root_folder)
        .context("Failed to initialize root folder")?;
    let pool = db::init_database_pool(&config.cache_path)
        .await
        .context("Failed to open cache database")?;

    let client = RxNavClient::new(&config.rxnav).context("Failed to build RxNav client")?;

    let cancel_token = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel_token.clone()));

    let mut runner = BatchRunner::new(Enricher::new(client), SqliteRecordCache::new(pool.clone()))
        .with_cancellation(cancel_token);

    let started_at = Utc::now();
    let report = runner.run(&ndcs, &config.output_path).await?;

    if let Err(e) = db::runs::record_run(&pool, &report, started_at, Utc::now()).await {
        warn!("Failed to record batch run: {}", e);
    }

    pool.close().await;

    if report.is_aborted() {
        error!(
            "Run {} aborted after {} new records; rerun to resume",
            report.run_id, report.processed
        );
        return Ok(ExitCode::FAILURE);
    }

    info!("Done: {} records in {}", report.total_records, config.output_path.display());
    Ok(ExitCode::SUCCESS)
}

/// Cancel the batch on Ctrl+C; the current identifier finishes first
async fn cancel_on_ctrl_c(token: CancellationToken) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received Ctrl+C, stopping after the current identifier");
            token.cancel();
        }
        Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
    }
}
