//! trifold-ui - side-by-side AI provider comparison
//!
//! Sends one question to OpenAI, Anthropic, and Gemini at once, shows
//! the answers next to each other for rating, and keeps history in
//! SQLite or a JSON archive file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trifold_common::config::{RootFolderInitializer, RootFolderResolver};
use trifold_ui::providers::ProviderSet;
use trifold_ui::storage::{ArchiveStore, SqliteStore, StoreSet};
use trifold_ui::{build_router, AppState};

/// Command-line arguments for trifold-ui
#[derive(Parser, Debug)]
#[command(name = "trifold-ui")]
#[command(about = "Ask three AI providers at once and compare their answers")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5730", env = "TRIFOLD_PORT")]
    port: u16,

    /// Root folder holding the database and archive file
    #[arg(short, long, env = "TRIFOLD_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = RootFolderResolver::new("trifold-ui");
    let toml_config = resolver.load_toml_config().unwrap_or_default();

    // RUST_LOG wins; the TOML logging level is the fallback
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&toml_config.logging.level)),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting trifold-ui v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = match &args.root_folder {
        Some(path) => path.clone(),
        None => resolver.resolve(),
    };

    let initializer = RootFolderInitializer::new(root_folder.clone());
    initializer.ensure_directory_exists()?;
    info!("Root folder: {}", root_folder.display());

    let pool = trifold_common::db::init_database(&initializer.database_path())
        .await
        .context("Failed to initialize database")?;

    let timeout_ms = trifold_ui::db::settings::get_ask_timeout_ms(&pool).await?;
    let providers = ProviderSet::new(&toml_config.providers, Duration::from_millis(timeout_ms))
        .context("Failed to build provider clients")?;

    let archive = ArchiveStore::new(initializer.archive_path());
    info!("Archive path: {}", archive.path().display());

    let stores = StoreSet::new(SqliteStore::new(pool.clone()), archive);
    let state = AppState::new(pool, stores, providers);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", args.port))
        .await
        .with_context(|| format!("Failed to bind to port {}", args.port))?;
    info!("trifold-ui listening on http://127.0.0.1:{}", args.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
