//! taskhub-server - task management REST API with real-time rooms
//!
//! Serves the `/api` endpoints, uploaded files under `/uploads`, and
//! task events over WebSocket (`/ws`) and SSE (`/api/events`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use taskhub_common::config::{CliOverrides, RootFolderInitializer, ServerConfig, TomlConfig};
use taskhub_common::db::init_database;
use taskhub_server::api::buildinfo::BuildInfo;
use taskhub_server::{build_router, AppState, RoomHub};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for taskhub-server
#[derive(Parser, Debug)]
#[command(name = "taskhub-server")]
#[command(about = "Task management API with real-time updates")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "TASKHUB_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, env = "TASKHUB_BIND")]
    bind: Option<String>,

    /// Root folder holding taskhub.db and uploads/
    #[arg(short, long, env = "TASKHUB_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = "TASKHUB_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskhub_server=debug,taskhub_common=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let build = BuildInfo::current();
    info!(
        "Starting TaskHub server v{} [{}] built {} ({})",
        build.version, build.git_hash, build.build_timestamp, build.build_profile
    );

    let args = Args::parse();

    let toml = TomlConfig::load_or_default(args.config.as_deref());
    let config = ServerConfig::resolve(
        CliOverrides {
            root_folder: args.root_folder,
            bind_address: args.bind,
            port: args.port,
        },
        toml,
    );
    info!("Root folder: {}", config.root_folder.display());

    let initializer = RootFolderInitializer::new(config.root_folder.clone());
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let hub = RoomHub::new(config.event_buffer);
    let state = AppState::new(pool, hub, initializer.uploads_path(), config.max_upload_bytes);
    let app = build_router(state);

    let addr = config.listen_address()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("taskhub-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

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
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
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
