// Origin proxy - forwards shim requests to the legacy origin
//
// The legacy CMS still serves a handful of paths (admin, login, the old
// Spanish tree). This module forwards those requests over HTTPS and scrubs
// every place the origin's hostname could leak back to the client: the
// Location header on redirects and, optionally, textual occurrences in
// text bodies.

pub mod error;
pub mod rewrite;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Response};
use url::Url;

use crate::config::Config;
use error::ProxyError;
use rewrite::{rewrite_body_origins, rewrite_location};

/// Request headers forwarded to the origin. Everything else is dropped so the
/// origin never sees proxy-internal or client-identifying extras.
const FORWARDED_REQUEST_HEADERS: [&str; 7] = [
    "accept",
    "accept-language",
    "user-agent",
    "cookie",
    "referer",
    "origin",
    "content-type",
];

/// Hop-by-hop headers that must never be relayed to the client.
const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Content types eligible for best-effort body hostname rewriting.
const REWRITABLE_CONTENT_TYPES: [&str; 3] = ["text/html", "application/json", "text/plain"];

/// Which `Host` header the origin sees.
///
/// `Inbound` echoes the public host, which keeps the legacy system from
/// issuing absolute redirects under its own name. `Origin` sends the origin's
/// real host for paths (admin, login) that refuse to serve under any other
/// name; redirect rewriting covers the leakage on those.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPolicy {
    Inbound,
    Origin,
}

/// Per-route forwarding policy supplied by the shim handlers.
#[derive(Debug, Clone)]
pub struct ForwardPolicy {
    /// Upstream path override; `None` forwards the inbound path unchanged
    pub upstream_path: Option<String>,

    /// Host header policy for the upstream request
    pub host: HostPolicy,

    /// Rewrite origin hostnames inside the response body
    pub rewrite_body: bool,

    /// Extra response headers set on the way out (cache/robots policy)
    pub response_headers: &'static [(&'static str, &'static str)],
}

/// Stateless forwarder bound to one legacy origin.
pub struct OriginProxy {
    client: reqwest::Client,
    origin_base: String,
    origin_host: String,
    public_base: String,
    public_host: String,
    legacy_hosts: Vec<String>,
    rewrite_body: bool,
}

impl OriginProxy {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let origin = Url::parse(&config.origin_url)?;
        let public = Url::parse(&config.public_url)?;
        let origin_host = origin
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("origin_url has no host: {}", config.origin_url))?
            .to_string();
        let public_host = public
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("public_url has no host: {}", config.public_url))?
            .to_string();

        // No automatic redirect following: the client must see the (rewritten)
        // redirect itself so the browser address bar stays on the public host.
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            origin_base: format!("{}://{}", origin.scheme(), origin_host),
            origin_host,
            public_base: format!("{}://{}", public.scheme(), public_host),
            public_host,
            legacy_hosts: config.legacy_hosts.clone(),
            rewrite_body: config.rewrite_body,
        })
    }

    pub fn origin_host(&self) -> &str {
        &self.origin_host
    }

    /// Forward one inbound request to the origin and return its response with
    /// redirect and (optionally) body hostnames rewritten.
    pub async fn forward(
        &self,
        req: Request<Body>,
        policy: &ForwardPolicy,
    ) -> Result<Response<Body>, ProxyError> {
        let method = req.method().clone();
        if !matches!(method, Method::GET | Method::HEAD | Method::POST) {
            return Err(ProxyError::MethodNotAllowed(method.to_string()));
        }

        let uri = req.uri().clone();
        let headers = req.headers().clone();

        let path = policy
            .upstream_path
            .as_deref()
            .unwrap_or_else(|| uri.path());
        let upstream_url = match uri.query() {
            Some(q) => format!("{}{}?{}", self.origin_base, path, q),
            None => format!("{}{}", self.origin_base, path),
        };

        tracing::debug!(method = %method, url = %upstream_url, "Forwarding to origin");

        // Body is only meaningful for POST here; GET/HEAD forward empty.
        let body_bytes = if method == Method::POST {
            axum::body::to_bytes(req.into_body(), usize::MAX)
                .await
                .map_err(|e| ProxyError::BodyRead(e.to_string()))?
        } else {
            bytes::Bytes::new()
        };

        let mut forward_req = self
            .client
            .request(method.clone(), &upstream_url)
            .body(body_bytes.to_vec());

        for name in FORWARDED_REQUEST_HEADERS {
            if let Some(value) = headers.get(name) {
                forward_req = forward_req.header(name, value.clone());
            }
        }

        let host_value = match policy.host {
            HostPolicy::Inbound => headers
                .get("host")
                .and_then(|v| v.to_str().ok())
                .unwrap_or(&self.public_host)
                .to_string(),
            HostPolicy::Origin => self.origin_host.clone(),
        };
        forward_req = forward_req.header("host", host_value);

        let upstream = forward_req
            .send()
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;

        let status = upstream.status();
        let upstream_headers = upstream.headers().clone();
        let body = upstream
            .bytes()
            .await
            .map_err(|e| ProxyError::BodyRead(e.to_string()))?;

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "Origin responded");

        let mut builder = Response::builder().status(status);

        for (name, value) in upstream_headers.iter() {
            if self.skip_response_header(name.as_str()) {
                continue;
            }
            if name == "location" {
                if let Ok(location) = value.to_str() {
                    if let Some(rewritten) = rewrite_location(
                        location,
                        &self.origin_host,
                        &self.legacy_hosts,
                        &self.public_base,
                    ) {
                        builder = builder.header(name, rewritten);
                        continue;
                    }
                }
            }
            builder = builder.header(name, value.clone());
        }

        for (name, value) in policy.response_headers {
            builder = set_header(builder, name, value);
        }

        let body = if self.should_rewrite_body(policy, &method, &upstream_headers) {
            match std::str::from_utf8(&body) {
                Ok(text) => Body::from(rewrite_body_origins(
                    text,
                    &self.origin_base,
                    &self.origin_host,
                    &self.public_base,
                    &self.public_host,
                )),
                // Declared a text content type but isn't valid UTF-8; pass through
                Err(_) => Body::from(body),
            }
        } else {
            Body::from(body)
        };

        builder
            .body(body)
            .map_err(|e| ProxyError::ResponseBuild(e.to_string()))
    }

    /// Hop-by-hop headers plus content-length, which may change after rewrite.
    fn skip_response_header(&self, name: &str) -> bool {
        HOP_BY_HOP_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h))
            || name.eq_ignore_ascii_case("content-length")
    }

    fn should_rewrite_body(
        &self,
        policy: &ForwardPolicy,
        method: &Method,
        headers: &HeaderMap,
    ) -> bool {
        if !self.rewrite_body || !policy.rewrite_body || method == Method::HEAD {
            return false;
        }
        headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|ct| {
                REWRITABLE_CONTENT_TYPES
                    .iter()
                    .any(|allowed| ct.starts_with(allowed))
            })
            .unwrap_or(false)
    }
}

/// Set a static policy header on the response builder, replacing any value
/// relayed from the origin.
fn set_header(
    mut builder: axum::http::response::Builder,
    name: &'static str,
    value: &'static str,
) -> axum::http::response::Builder {
    if let (Ok(name), Ok(value)) = (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        if let Some(headers) = builder.headers_mut() {
            headers.remove(&name);
        }
        builder = builder.header(name, value);
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy() -> OriginProxy {
        let mut config = Config::default();
        config.origin_url = "https://legacy.example.com".to_string();
        config.public_url = "https://www.example.com".to_string();
        OriginProxy::new(&config).expect("proxy should build from default config")
    }

    #[test]
    fn test_hop_by_hop_headers_are_skipped() {
        let proxy = proxy();
        for name in [
            "Connection",
            "keep-alive",
            "Proxy-Authenticate",
            "proxy-authorization",
            "TE",
            "trailer",
            "Transfer-Encoding",
            "upgrade",
        ] {
            assert!(proxy.skip_response_header(name), "{name} should be stripped");
        }
        assert!(proxy.skip_response_header("content-length"));
        assert!(!proxy.skip_response_header("content-type"));
        assert!(!proxy.skip_response_header("set-cookie"));
        assert!(!proxy.skip_response_header("x-robots-tag"));
    }

    #[test]
    fn test_body_rewrite_gate_respects_content_type_and_method() {
        let proxy = proxy();
        let policy = ForwardPolicy {
            upstream_path: None,
            host: HostPolicy::Inbound,
            rewrite_body: true,
            response_headers: &[],
        };

        let mut headers = HeaderMap::new();
        headers.insert("content-type", "text/html; charset=utf-8".parse().unwrap());
        assert!(proxy.should_rewrite_body(&policy, &Method::GET, &headers));
        // HEAD responses are never rewritten
        assert!(!proxy.should_rewrite_body(&policy, &Method::HEAD, &headers));

        headers.insert("content-type", "image/png".parse().unwrap());
        assert!(!proxy.should_rewrite_body(&policy, &Method::GET, &headers));

        headers.insert("content-type", "application/json".parse().unwrap());
        assert!(proxy.should_rewrite_body(&policy, &Method::GET, &headers));

        let no_rewrite = ForwardPolicy {
            rewrite_body: false,
            ..policy
        };
        assert!(!proxy.should_rewrite_body(&no_rewrite, &Method::GET, &headers));
    }

    #[test]
    fn test_policy_header_replaces_relayed_value() {
        let builder = Response::builder().header("x-robots-tag", "index, follow");
        let builder = set_header(builder, "x-robots-tag", "noindex, nofollow");
        let response = builder.body(Body::empty()).unwrap();

        let values: Vec<_> = response.headers().get_all("x-robots-tag").iter().collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0], "noindex, nofollow");
    }

    #[test]
    fn test_policy_headers_accept_all_shim_values() {
        for (name, value) in [
            ("cache-control", "no-store, max-age=0"),
            ("x-robots-tag", "noindex, nofollow"),
            ("x-robots-tag", "noindex, follow"),
        ] {
            let response = set_header(Response::builder(), name, value)
                .body(Body::empty())
                .unwrap();
            assert_eq!(
                response.headers().get(name).and_then(|v| v.to_str().ok()),
                Some(value)
            );
        }
    }

    #[tokio::test]
    async fn test_unsupported_method_is_rejected() {
        let proxy = proxy();
        let policy = ForwardPolicy {
            upstream_path: None,
            host: HostPolicy::Inbound,
            rewrite_body: false,
            response_headers: &[],
        };
        let req = Request::builder()
            .method(Method::DELETE)
            .uri("/wp-admin")
            .body(Body::empty())
            .unwrap();

        match proxy.forward(req, &policy).await {
            Err(ProxyError::MethodNotAllowed(m)) => assert_eq!(m, "DELETE"),
            other => panic!("expected MethodNotAllowed, got {:?}", other.map(|_| ())),
        }
    }
}
