//! research-worker - Background task worker entry point

use anyhow::{Context, Result};
use clap::Parser;
use research_common::config::{prepare_data_folder, resolve_data_folder, TomlConfig};
use research_common::db::init_database;
use research_worker::Worker;
use std::path::PathBuf;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for research-worker
#[derive(Parser, Debug)]
#[command(name = "research-worker")]
#[command(about = "Background task worker for the research platform")]
#[command(version)]
struct Args {
    /// Folder holding research.db
    #[arg(short, long)]
    data_folder: Option<PathBuf>,

    /// Maximum number of tasks executing at once
    #[arg(short, long, env = "RESEARCH_WORKER_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Sleep between queue polls when idle, in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Worker name recorded on claimed tasks
    #[arg(short, long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = TomlConfig::load_or_default();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "research_worker={level},research_common={level}",
                    level = config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting research-worker v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let data_folder = resolve_data_folder(args.data_folder.as_deref(), &config);
    let db_path = prepare_data_folder(&data_folder).context("Failed to prepare data folder")?;
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let mut worker_config = config.worker.clone();
    if let Some(concurrency) = args.concurrency {
        worker_config.concurrency = concurrency;
    }
    if let Some(poll_interval_ms) = args.poll_interval_ms {
        worker_config.poll_interval_ms = poll_interval_ms;
    }
    let name = args
        .name
        .unwrap_or_else(|| format!("research-worker-{}", std::process::id()));

    let worker = Worker::from_config(pool, &worker_config, name);
    info!(
        "Worker {} starting with {} concurrent task slots",
        worker.name(),
        worker.concurrency()
    );

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    let stats = worker.run(shutdown).await.context("Worker error")?;
    info!(
        "Worker shutdown complete ({} succeeded, {} failed)",
        stats.succeeded, stats.failed
    );
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
