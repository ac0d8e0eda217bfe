use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediawatch_core::config::CONFIG_PATH_ENV;
use mediawatch_core::{
    load_config, spawn_sync_helper, validate_config, Config, Encoder, FfmpegEncoder,
    IngestService, LogFormat,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config_path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);

    // Logging needs the config, so a bad config is reported on stderr.
    let config = match load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging(LogFormat::Pretty);
            return Err(e).with_context(|| match &config_path {
                Some(path) => format!("Failed to load config from {:?}", path),
                None => "Failed to load config from environment".to_string(),
            });
        }
    };
    init_logging(config.logging.format);

    info!("mediawatch v{} starting", VERSION);
    if let Some(path) = &config_path {
        info!("Loaded configuration from {:?}", path);
    }
    validate_config(&config).context("Configuration validation failed")?;
    debug!(
        "Effective configuration: {}",
        serde_json::to_string(&config).unwrap_or_default()
    );

    info!("Input directory: {}", config.watch.input_dir.display());
    info!(
        "Output directories: movies={}, tv={}, music={}",
        config.output.movies_dir.display(),
        config.output.tv_dir.display(),
        config.output.music_dir.display()
    );
    info!(
        "Quiescence policy: {:?} ({} ms delay)",
        config.watch.quiescence.policy, config.watch.quiescence.delay_ms
    );

    create_output_roots(&config).await?;

    match spawn_sync_helper(&config.sync_helper) {
        Ok(Some(_)) => {}
        Ok(None) => info!("Sync helper disabled"),
        Err(e) => error!("{}", e),
    }

    let encoder = Arc::new(FfmpegEncoder::new(config.encoder.clone()));
    match encoder.validate().await {
        Ok(version) => info!("Using {}", version),
        Err(e) => error!("Encoder check failed, jobs will fail until fixed: {}", e),
    }

    let service = IngestService::new(&config, encoder);
    let stats = service
        .run_until(shutdown_signal())
        .await
        .context("Ingest service failed")?;

    info!(
        "Shutdown complete ({} succeeded, {} failed)",
        stats.succeeded, stats.failed
    );
    Ok(())
}

fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn create_output_roots(config: &Config) -> Result<()> {
    for dir in config.output.roots() {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
