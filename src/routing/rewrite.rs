//! URL rewrite rules.
//!
//! A [`RewriteRule`] turns the path and query of an inbound request into the
//! absolute URI of the upstream call. Rules are pure: they hold their targets
//! by value and never look at shared state.
//!
//! Passthrough targets are assembled as raw text and parsed straight into an
//! [`Uri`], so the caller's escaped path and query reach the upstream exactly as
//! they were received. Only dot segments and empty segments are resolved.

use axum::http::Uri;
use thiserror::Error;
use url::{form_urlencoded, Position, Url};

use crate::routing::matcher::strip_route_prefix;

/// Failure to derive an outbound URI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("path {path:?} does not belong to route {route:?}")]
    PrefixMismatch { route: String, path: String },

    #[error("invalid outbound uri: {0}")]
    InvalidUri(String),
}

/// How a route maps an inbound request onto its upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteRule {
    /// Forward the path after `/<name>` onto `base`, query string untouched.
    Passthrough { base: Url },

    /// Ignore the inbound path, target `base`, and merge `params` into the
    /// caller's query parameters.
    QueryInject {
        base: Url,
        params: Vec<(String, String)>,
    },
}

impl RewriteRule {
    pub fn passthrough(base: Url) -> Self {
        Self::Passthrough { base }
    }

    pub fn query_inject<K, V>(base: Url, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::QueryInject {
            base,
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Build the outbound URI for a request that matched the route `route`.
    pub fn build(&self, route: &str, incoming: &Uri) -> Result<Uri, RewriteError> {
        match self {
            Self::Passthrough { base } => {
                let rest = strip_route_prefix(incoming.path(), route).ok_or_else(|| {
                    RewriteError::PrefixMismatch {
                        route: route.to_string(),
                        path: incoming.path().to_string(),
                    }
                })?;

                let mut target = String::from(&base[..Position::BeforePath]);
                target.push_str(&clean_path(base.path(), rest));
                if let Some(query) = incoming.query().filter(|q| !q.is_empty()) {
                    target.push('?');
                    target.push_str(query);
                }
                parse_uri(&target)
            }
            Self::QueryInject { base, params } => {
                let mut pairs: Vec<(String, String)> = incoming
                    .query()
                    .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
                    .unwrap_or_default();
                pairs.extend(params.iter().cloned());
                // Stable: repeated keys keep their relative order.
                pairs.sort_by(|a, b| a.0.cmp(&b.0));

                let query = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs)
                    .finish();

                let mut url = base.clone();
                url.set_query((!query.is_empty()).then_some(query.as_str()));
                url.set_fragment(None);
                parse_uri(url.as_str())
            }
        }
    }

    /// The upstream base this rule targets.
    pub fn base(&self) -> &Url {
        match self {
            Self::Passthrough { base } | Self::QueryInject { base, .. } => base,
        }
    }
}

fn parse_uri(target: &str) -> Result<Uri, RewriteError> {
    target
        .parse()
        .map_err(|e: axum::http::uri::InvalidUri| RewriteError::InvalidUri(e.to_string()))
}

/// Join `rest` onto `base`, dropping empty and `.` segments and resolving
/// `..` without climbing above the root. A trailing `/` on `rest` is kept.
fn clean_path(base: &str, rest: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(rest.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    let mut path = String::with_capacity(base.len() + rest.len() + 1);
    for segment in &segments {
        path.push('/');
        path.push_str(segment);
    }
    if path.is_empty() || rest.ends_with('/') {
        path.push('/');
    }
    path
}
