//! Hostname rewriting for proxied responses
//!
//! Two scrubbing passes keep the legacy hostname out of client-visible
//! responses: absolute `Location` headers pointing at the origin (or one of
//! the known legacy hostnames) are re-rooted onto the public site, and text
//! bodies get a literal substring replacement of the origin's base URL and
//! bare host. The body pass is best effort by design: it is a textual
//! replacement, not an HTML or JSON parse, so escaped or encoded occurrences
//! are missed and unrelated text containing the hostname is touched.

use url::Url;

/// Rewrite an absolute `Location` header that points at the legacy system.
///
/// Returns `None` when the value should be relayed untouched: relative
/// locations, unparseable values, and hosts that are neither the origin nor a
/// known legacy hostname. Path, query and fragment are preserved; only
/// scheme and host change.
pub fn rewrite_location(
    location: &str,
    origin_host: &str,
    legacy_hosts: &[String],
    public_base: &str,
) -> Option<String> {
    let url = Url::parse(location).ok()?;
    let host = url.host_str()?;

    let is_legacy = host.eq_ignore_ascii_case(origin_host)
        || legacy_hosts.iter().any(|h| host.eq_ignore_ascii_case(h));
    if !is_legacy {
        return None;
    }

    let mut rewritten = format!("{}{}", public_base.trim_end_matches('/'), url.path());
    if let Some(query) = url.query() {
        rewritten.push('?');
        rewritten.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        rewritten.push('#');
        rewritten.push_str(fragment);
    }
    Some(rewritten)
}

/// Replace textual occurrences of the origin in a response body.
///
/// The full `scheme://host` form is replaced first so the bare-host pass does
/// not split absolute URLs in half.
pub fn rewrite_body_origins(
    body: &str,
    origin_base: &str,
    origin_host: &str,
    public_base: &str,
    public_host: &str,
) -> String {
    body.replace(origin_base, public_base)
        .replace(origin_host, public_host)
}
