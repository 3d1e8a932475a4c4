//! Hondana server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use hondana_core::config::AppConfig;
use hondana_server::{create_router, AppState};
use hondana_storage::ObjectStore;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Hondana - illustrated-content cache server
#[derive(Parser, Debug)]
#[command(name = "hondanad")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "HONDANA_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Hondana v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    let has_config_file = config_path.exists();

    if has_config_file {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let has_env_config =
        std::env::vars().any(|(key, _)| key.starts_with("HONDANA_") && key != "HONDANA_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: hondanad --config /path/to/config.toml\n  \
             2. Environment variables: HONDANA_SERVER__BIND=0.0.0.0:8080 \
             HONDANA_UPSTREAM__ACCESS_TOKEN=... HONDANA_UPSTREAM__WEBHOOK_SECRET=... \
             HONDANA_ADMIN__TOKEN_HASH=... hondanad\n\n\
             Set HONDANA_CONFIG to specify a default config file path."
        );
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("HONDANA_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    // Initialize the object cache backend and verify connectivity before
    // accepting requests; the server must not report healthy with
    // unreachable storage.
    let storage = hondana_storage::from_config(&config.storage)
        .await
        .context("failed to initialize storage")?;
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!(
        backend = storage.backend_name(),
        "Storage backend initialized"
    );

    // Initialize the metadata store
    let metadata = hondana_metadata::from_config(&config.metadata)
        .await
        .context("failed to initialize metadata store")?;
    tracing::info!("Metadata store initialized");

    // Initialize the archive source
    let source = hondana_upstream::from_config(&config.upstream, &config.server)
        .context("failed to initialize archive source")?;
    tracing::info!("Archive source initialized");

    let state = AppState::new(config.clone(), storage, metadata, source);
    let app = create_router(state);

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
