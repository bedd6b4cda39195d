//! Interview Support API (idesk-api) - Main entry point
//!
//! Serves the mismatch and validation NDJSON feeds, the correction
//! endpoints and branch reports over a MongoDB task collection.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use idesk_api::{build_router, AppState};
use idesk_common::config::{ConfigOverrides, ServiceConfig};
use idesk_common::db::MongoConnector;
use idesk_common::store::MongoTaskStore;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for idesk-api
#[derive(Parser, Debug)]
#[command(name = "idesk-api")]
#[command(about = "Interview Support dashboard API")]
#[command(version)]
struct Args {
    /// MongoDB connection string
    #[arg(long, env = "MONGODB_URI", hide_env_values = true)]
    mongodb_uri: Option<String>,

    /// Database name
    #[arg(long)]
    database: Option<String>,

    /// Task collection name
    #[arg(long)]
    collection: Option<String>,

    /// Address to listen on, e.g. 127.0.0.1:5730
    #[arg(short, long)]
    bind: Option<String>,

    /// IANA zone used to decide "today" for the live feed
    #[arg(long)]
    timezone: Option<String>,

    /// Path to config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        ConfigOverrides {
            mongodb_uri: args.mongodb_uri,
            database: args.database,
            collection: args.collection,
            bind: args.bind,
            timezone: args.timezone,
            config_file: args.config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "idesk_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting idesk-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = ServiceConfig::resolve(&args.into()).context("Failed to resolve configuration")?;
    info!(
        "Database: {} / collection: {} / timezone: {}",
        config.database, config.collection, config.timezone
    );

    let connector = Arc::new(MongoConnector::new(
        config.mongodb_uri.clone(),
        config.database.clone(),
    ));

    // Requests retry the connection, so a database that is down at startup
    // only degrades the feeds until it comes back.
    if let Err(e) = connector.database().await {
        warn!("MongoDB not reachable at startup: {}", e);
    }

    let store = Arc::new(MongoTaskStore::new(connector, config.collection.clone()));
    let app = build_router(AppState::new(store, config.timezone));

    info!("Starting HTTP server on {}", config.bind);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

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
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
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
