//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files; the
//! environment loader fills the same structure.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default target for the `location-autocomplete` route.
pub const HERE_AUTOCOMPLETE_URL: &str = "https://autocomplete.search.hereapi.com/v1/autocomplete";

/// Default target for the `location-lookup` route.
pub const HERE_LOOKUP_URL: &str = "https://lookup.search.hereapi.com/v1/lookup";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Base URLs of the proxied services.
    pub upstreams: UpstreamConfig,

    /// here.com geocoding settings used by the query-injecting routes.
    pub here: HereConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Cross-origin header policy.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Base URLs for the path-passthrough services.
///
/// Values are raw until the loader normalizes them to `scheme://host/`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    pub zenflows_url: String,
    pub inbox_url: String,
    pub wallet_url: String,
    pub osh_url: String,
}

impl UpstreamConfig {
    /// `(setting name, value)` pairs, in route order.
    pub fn entries(&self) -> [(&'static str, &str); 4] {
        [
            ("ZENFLOWS_URL", &self.zenflows_url),
            ("INBOX_URL", &self.inbox_url),
            ("WALLET_URL", &self.wallet_url),
            ("OSH_URL", &self.osh_url),
        ]
    }
}

/// here.com settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HereConfig {
    /// Opaque API key, injected as the `apiKey` query parameter.
    pub api_key: String,

    /// Fixed target of the autocomplete route.
    pub autocomplete_url: String,

    /// Fixed target of the lookup route.
    pub lookup_url: String,
}

impl Default for HereConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            autocomplete_url: HERE_AUTOCOMPLETE_URL.to_string(),
            lookup_url: HERE_LOOKUP_URL.to_string(),
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Overall budget of one upstream attempt, body included, in seconds.
    pub request_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Upper bound on producing response headers for a caller, in seconds.
    /// Must cover every retry attempt.
    pub handler_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 10,
            connect_secs: 30,
            handler_secs: 45,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per request, the first one included.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds (0 = retry at once).
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 0,
            max_delay_ms: 250,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest request body buffered for forwarding, in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Cross-origin header policy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Also add the permissive CORS headers to relayed upstream responses.
    /// Discovery and failure responses always carry them.
    pub proxied_responses: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter, overridden by `RUST_LOG`.
    pub log_level: String,

    /// Directory holding `proxy.log`. Logs go to stderr when unset.
    pub log_dir: Option<PathBuf>,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
