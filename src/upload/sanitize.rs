//! Filename sanitization for storage object keys
//!
//! Client-declared filenames end up inside object keys and, later, email
//! notifications, so they are normalized to a bounded, shell- and URL-safe
//! alphabet before any key is built.

/// Maximum length of a sanitized filename.
pub const MAX_FILENAME_LEN: usize = 120;

/// Map a filename onto `[A-Za-z0-9._-]`, collapsing runs of `_` and bounding
/// the result to [`MAX_FILENAME_LEN`] characters.
///
/// Any character outside the safe alphabet becomes `_`, so path separators,
/// control characters and header-breaking bytes cannot survive. Non-empty
/// input always yields non-empty output.
pub fn sanitize_filename(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len().min(MAX_FILENAME_LEN));
    let mut prev_underscore = false;

    for c in raw.chars() {
        if out.len() >= MAX_FILENAME_LEN {
            break;
        }
        let mapped = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            c
        } else {
            '_'
        };
        if mapped == '_' {
            if prev_underscore {
                continue;
            }
            prev_underscore = true;
        } else {
            prev_underscore = false;
        }
        out.push(mapped);
    }

    out
}
