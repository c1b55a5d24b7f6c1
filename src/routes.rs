// Route shims - edge entry points for surviving legacy paths
//
// Each shim is a thin policy wrapper around the origin proxy: which Host
// header the origin sees, whether the body gets hostname-scrubbed, and which
// cache/robots headers go out. The decommissioned sitemap path answers a
// fixed 410 without touching the origin.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, Response, StatusCode};

use crate::proxy::error::ProxyError;
use crate::proxy::{ForwardPolicy, HostPolicy};
use crate::server::AppState;

pub const LEGACY_ADMIN_PATH: &str = "/wp-admin";
pub const LEGACY_LOGIN_PATH: &str = "/wp-login.php";
pub const LEGACY_ES_PATH: &str = "/es";
pub const LEGACY_SITEMAP_PATH: &str = "/page-sitemap.xml";

const NO_STORE: (&str, &str) = ("cache-control", "no-store, max-age=0");
const ROBOTS_NOINDEX_NOFOLLOW: (&str, &str) = ("x-robots-tag", "noindex, nofollow");
const ROBOTS_NOINDEX_FOLLOW: (&str, &str) = ("x-robots-tag", "noindex, follow");

/// Legacy CMS admin tree. The CMS refuses to serve admin screens under any
/// other name, so the origin sees its own Host; redirect rewriting covers
/// the leakage.
pub async fn legacy_admin(
    State(state): State<AppState>,
    req: Request<Body>,
) -> Result<Response<Body>, ProxyError> {
    ensure_forwarding(&state)?;
    let policy = ForwardPolicy {
        upstream_path: None,
        host: HostPolicy::Origin,
        rewrite_body: false,
        response_headers: &[NO_STORE, ROBOTS_NOINDEX_NOFOLLOW],
    };
    state.proxy.forward(req, &policy).await
}

/// Legacy CMS login page. Same host policy as the admin tree.
pub async fn legacy_login(
    State(state): State<AppState>,
    req: Request<Body>,
) -> Result<Response<Body>, ProxyError> {
    ensure_forwarding(&state)?;
    let policy = ForwardPolicy {
        upstream_path: None,
        host: HostPolicy::Origin,
        rewrite_body: false,
        response_headers: &[NO_STORE, ROBOTS_NOINDEX_NOFOLLOW],
    };
    state.proxy.forward(req, &policy).await
}

/// Old Spanish content tree, still served by the legacy system while pages
/// migrate. Served under the public host with body scrubbing on, since these
/// pages embed absolute links to the origin.
pub async fn legacy_spanish(
    State(state): State<AppState>,
    req: Request<Body>,
) -> Result<Response<Body>, ProxyError> {
    ensure_forwarding(&state)?;
    let policy = ForwardPolicy {
        upstream_path: None,
        host: HostPolicy::Inbound,
        rewrite_body: true,
        response_headers: &[NO_STORE, ROBOTS_NOINDEX_FOLLOW],
    };
    state.proxy.forward(req, &policy).await
}

/// Decommissioned legacy sitemap: permanent 410 so crawlers drop it.
pub async fn legacy_sitemap() -> Response<Body> {
    Response::builder()
        .status(StatusCode::GONE)
        .header(ROBOTS_NOINDEX_FOLLOW.0, ROBOTS_NOINDEX_FOLLOW.1)
        .body(Body::empty())
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

/// Preview deployments never reach the legacy origin.
fn ensure_forwarding(state: &AppState) -> Result<(), ProxyError> {
    if state.config.environment.forwarding_enabled() {
        Ok(())
    } else {
        Err(ProxyError::ForwardingDisabled)
    }
}
