// studio-edge - Edge gateway for the studio marketing site
//
// Sits in front of the public site and covers the pieces the platform cannot
// serve itself:
// - Route shims (axum): forward surviving legacy paths to the old CMS origin,
//   scrubbing redirects and hostnames so the origin never surfaces publicly
// - Upload broker: mints presigned PUT URLs so questionnaire attachments go
//   straight to the storage bucket without streaming through this process
// - Intake engine: the questionnaire state machine used by the form frontends

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use studio_edge::cli;
use studio_edge::config::Config;
use studio_edge::proxy::OriginProxy;
use studio_edge::server::{start_server, AppState};
use studio_edge::upload::signer::{GcsSigner, UnconfiguredSigner, UrlSigner};

#[tokio::main]
async fn main() -> Result<()> {
    // Handle CLI commands first (config --show, --reset, --path)
    // If a command was handled, exit early
    if cli::handle_cli() {
        return Ok(());
    }

    // Ensure config template exists (helps operators discover options)
    Config::ensure_config_exists();

    let config = Config::from_env();

    // Precedence: RUST_LOG env var > config file > default "info"
    let default_filter = format!("studio_edge={},tower_http=info", config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        version = studio_edge::config::VERSION,
        environment = config.environment.as_str(),
        "Starting studio-edge"
    );
    if !config.environment.forwarding_enabled() {
        tracing::info!("Preview environment: legacy-origin forwarding disabled");
    }

    // Storage signer: fall back to the unconfigured stand-in so the gateway
    // still serves the shim routes when the bucket or credentials are absent.
    let signer: Arc<dyn UrlSigner> = match GcsSigner::connect(&config.storage).await {
        Ok(signer) => {
            tracing::info!(bucket = %config.storage.bucket, "Upload broker ready");
            Arc::new(signer)
        }
        Err(e) => {
            tracing::warn!("Upload broker disabled: {e}");
            Arc::new(UnconfiguredSigner)
        }
    };

    let proxy = Arc::new(OriginProxy::new(&config)?);
    let state = AppState {
        config: Arc::new(config),
        proxy,
        signer,
    };

    // Graceful shutdown: Ctrl+C fires the oneshot, the server drains and exits
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(state, shutdown_rx).await {
            tracing::error!("Server error: {e:#}");
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    let _ = shutdown_tx.send(());
    let _ = server_handle.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
