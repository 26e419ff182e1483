//! songlib-server - song catalog HTTP service
//!
//! Configuration priority: command line, then environment, then the TOML
//! file, then built-in defaults.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use songlib_common::config::{ConfigResolver, SonglibConfig};
use songlib_server::db::{self, SongStore};
use songlib_server::metadata::MetadataClient;
use songlib_server::{build_router, AppState, CatalogService};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for songlib-server
#[derive(Parser, Debug)]
#[command(name = "songlib-server")]
#[command(about = "Song catalog service with remote metadata enrichment")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "SONGLIB_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "SONGLIB_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SONGLIB_PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(short, long, env = "SONGLIB_DATABASE")]
    database: Option<PathBuf>,

    /// Metadata service URL
    #[arg(long, env = "SONGLIB_METADATA_ENDPOINT")]
    metadata_endpoint: Option<String>,
}

impl Args {
    fn apply(self, config: &mut SonglibConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(path) = self.database {
            config.database.path = path;
        }
        if let Some(endpoint) = self.metadata_endpoint {
            config.metadata.endpoint = endpoint;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ConfigResolver::new(args.config.clone())
        .resolve()
        .context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting songlib-server v{} on {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.server.host,
        config.server.port
    );
    info!("Database path: {}", config.database.path.display());

    let pool = match db::connect(&config.database).await {
        Ok(pool) => {
            info!("Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to connect to database: {:#}", e);
            return Err(e);
        }
    };
    db::ensure_schema(&pool)
        .await
        .context("Failed to create database schema")?;

    let store = SongStore::new(pool.clone(), config.database.operation_timeout());
    let metadata = MetadataClient::new(&config.metadata.endpoint, config.metadata.timeout())
        .context("Failed to build metadata client")?;
    info!("Metadata service: {}", metadata.endpoint());

    let catalog = CatalogService::new(Arc::new(store), Arc::new(metadata));
    let app = build_router(AppState::new(catalog), &config.server.api_version);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!(
        "Listening on http://{}/api/v{}",
        addr, config.server.api_version
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
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
            Ok(mut stream) => {
                stream.recv().await;
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
