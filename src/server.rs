//! Gateway server setup and initialization

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::routing::{any, get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::proxy::OriginProxy;
use crate::routes;
use crate::upload::handle_upload;
use crate::upload::signer::UrlSigner;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub proxy: Arc<OriginProxy>,
    pub signer: Arc<dyn UrlSigner>,
}

/// Build the gateway router: the upload broker endpoint plus the legacy
/// route shims. Everything else is expected to be served upstream of this
/// process and never reaches it.
pub fn build_router(state: AppState) -> Router {
    // The questionnaire posts from the browser, so the broker endpoint needs
    // a permissive CORS preflight answer. Grants are useless without bucket
    // credentials baked into the signed URL itself.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route(
            "/api/questionnaire/upload/",
            post(handle_upload).layer(cors),
        )
        .route(routes::LEGACY_ADMIN_PATH, any(routes::legacy_admin))
        .route(
            &format!("{}/*path", routes::LEGACY_ADMIN_PATH),
            any(routes::legacy_admin),
        )
        .route(routes::LEGACY_LOGIN_PATH, any(routes::legacy_login))
        .route(routes::LEGACY_ES_PATH, any(routes::legacy_spanish))
        .route(
            &format!("{}/*path", routes::LEGACY_ES_PATH),
            any(routes::legacy_spanish),
        )
        .route(routes::LEGACY_SITEMAP_PATH, get(routes::legacy_sitemap))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway server, running until the shutdown signal fires.
pub async fn start_server(
    state: AppState,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<()> {
    let bind_addr = state.config.bind_addr;
    let app = build_router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .context("Failed to bind to address")?;

    tracing::info!("Gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_rx.await.ok();
        })
        .await
        .context("Server error")?;

    tracing::info!("Gateway shut down gracefully");
    Ok(())
}
