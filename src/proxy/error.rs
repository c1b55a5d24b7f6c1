//! Proxy error types and response handling

use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
};

/// Errors that can occur while forwarding to the legacy origin
#[derive(Debug)]
pub enum ProxyError {
    /// Shim routes only accept GET/HEAD/POST
    MethodNotAllowed(String),
    /// Forwarding is disabled in this environment (preview deployments)
    ForwardingDisabled,
    BodyRead(String),
    Upstream(String),
    ResponseBuild(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response<Body> {
        let (status, message) = match self {
            ProxyError::MethodNotAllowed(m) => (
                StatusCode::METHOD_NOT_ALLOWED,
                format!("Method {} is not supported on this path", m),
            ),
            ProxyError::ForwardingDisabled => {
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            ProxyError::BodyRead(msg) => (StatusCode::BAD_REQUEST, msg),
            ProxyError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            ProxyError::ResponseBuild(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        tracing::error!("Proxy error: {} - {}", status, message);

        Response::builder()
            .status(status)
            .body(Body::from(message))
            .unwrap_or_else(|_| Response::new(Body::from("Internal error building error response")))
    }
}
