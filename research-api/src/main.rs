//! research-api - HTTP service entry point

use anyhow::{Context, Result};
use clap::Parser;
use research_api::{build_router, AppState};
use research_common::config::{prepare_data_folder, resolve_data_folder, TomlConfig};
use research_common::db::init_database;
use std::path::PathBuf;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for research-api
#[derive(Parser, Debug)]
#[command(name = "research-api")]
#[command(about = "HTTP API for the multi-agent research platform")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "RESEARCH_API_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "RESEARCH_API_HOST")]
    host: Option<String>,

    /// Folder holding research.db
    #[arg(short, long)]
    data_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = TomlConfig::load_or_default();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "research_api={level},research_common={level},tower_http={level}",
                    level = config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting research-api v{} [{}] built {} ({})",
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

    let state = AppState::new(pool);
    info!("Environment: {}", state.environment);
    let app = build_router(state);

    let host = args.host.unwrap_or(config.api.host);
    let port = args.port.unwrap_or(config.api.port);
    let addr = format!("{}:{}", host, port);

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
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
