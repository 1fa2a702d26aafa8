//! Route prefix matching.
//!
//! # Responsibilities
//! - Extract the first path segment of a request path
//! - Strip a route's `/<name>` prefix from a path
//!
//! # Design Decisions
//! - Segment comparison is exact and case-sensitive
//! - No regex or longest-prefix search: route names are disjoint literal segments
//! - Works on the raw (still percent-encoded) path so the remainder is forwarded untouched

/// First segment of `path`: the text between the leading `/` and the next `/`.
///
/// Returns `None` for the root path and for paths that do not start with `/`.
pub fn first_segment(path: &str) -> Option<&str> {
    let rest = path.strip_prefix('/')?;
    let segment = rest.split('/').next().unwrap_or_default();
    if segment.is_empty() {
        None
    } else {
        Some(segment)
    }
}

/// The part of `path` after `/<name>`, e.g. `/v1/items` for `/<name>/v1/items`.
///
/// Yields an empty string when the path is exactly `/<name>`, and `None` when
/// the path does not belong to `name`.
pub fn strip_route_prefix<'a>(path: &'a str, name: &str) -> Option<&'a str> {
    let rest = path.strip_prefix('/')?.strip_prefix(name)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}
