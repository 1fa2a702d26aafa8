//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store the fixed, ordered list of routes
//! - Look up the route owning a request path
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) lookup via HashMap from name to position; order kept for discovery
//! - Explicit NoMatch rather than silent default

use axum::http::Uri;
use std::collections::HashMap;
use thiserror::Error;

use crate::config::GatewayConfig;
use crate::config::validation::{normalize_base_url, parse_target_url, ValidationError};
use crate::routing::matcher::first_segment;
use crate::routing::rewrite::{RewriteError, RewriteRule};

/// Query parameter carrying the here.com API key.
pub const API_KEY_PARAM: &str = "apiKey";

/// Error type for route table construction.
#[derive(Debug, Error)]
pub enum RouteTableError {
    #[error("duplicate route name {0:?}")]
    DuplicateName(String),

    #[error("route name {0:?} is reserved or not a single path segment")]
    ReservedName(String),

    #[error(transparent)]
    Config(#[from] ValidationError),
}

/// A named upstream: the first path segment plus its rewrite rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    pub rewrite: RewriteRule,
}

impl Route {
    pub fn new(name: impl Into<String>, rewrite: RewriteRule) -> Self {
        Self {
            name: name.into(),
            rewrite,
        }
    }

    /// Outbound URI for an inbound request routed here.
    pub fn outbound_uri(&self, incoming: &Uri) -> Result<Uri, RewriteError> {
        self.rewrite.build(&self.name, incoming)
    }
}

/// Immutable route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    by_name: HashMap<String, usize>,
}

impl RouteTable {
    /// Build a table, rejecting duplicate or unusable names.
    pub fn new(routes: Vec<Route>) -> Result<Self, RouteTableError> {
        let mut by_name = HashMap::with_capacity(routes.len());

        for (idx, route) in routes.iter().enumerate() {
            if route.name.is_empty() || route.name.contains('/') {
                return Err(RouteTableError::ReservedName(route.name.clone()));
            }
            if by_name.insert(route.name.clone(), idx).is_some() {
                return Err(RouteTableError::DuplicateName(route.name.clone()));
            }
        }

        Ok(Self { routes, by_name })
    }

    /// The gateway's fixed route set, targeting the configured upstreams.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, RouteTableError> {
        let upstreams = &config.upstreams;
        let here = &config.here;
        let api_key = [(API_KEY_PARAM, here.api_key.as_str())];

        let routes = vec![
            Route::new(
                "zenflows",
                RewriteRule::passthrough(normalize_base_url("ZENFLOWS_URL", &upstreams.zenflows_url)?),
            ),
            Route::new(
                "location-autocomplete",
                RewriteRule::query_inject(
                    parse_target_url("HERE_AUTOCOMPLETE_URL", &here.autocomplete_url)?,
                    api_key,
                ),
            ),
            Route::new(
                "location-lookup",
                RewriteRule::query_inject(
                    parse_target_url("HERE_LOOKUP_URL", &here.lookup_url)?,
                    api_key,
                ),
            ),
            Route::new(
                "inbox",
                RewriteRule::passthrough(normalize_base_url("INBOX_URL", &upstreams.inbox_url)?),
            ),
            Route::new(
                "wallet",
                RewriteRule::passthrough(normalize_base_url("WALLET_URL", &upstreams.wallet_url)?),
            ),
            Route::new(
                "osh",
                RewriteRule::passthrough(normalize_base_url("OSH_URL", &upstreams.osh_url)?),
            ),
        ];

        Self::new(routes)
    }

    /// Find the route whose name equals the first segment of `path`.
    pub fn lookup(&self, path: &str) -> Option<&Route> {
        let segment = first_segment(path)?;
        self.by_name.get(segment).map(|&idx| &self.routes[idx])
    }

    /// Routes in declaration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
