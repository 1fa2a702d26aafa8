//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every upstream base URL is an absolute http(s) URL with a host
//! - Normalize base URLs down to `scheme://host[:port]/`
//! - Validate the bind address and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system; nothing is re-checked per request

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0:?} must be provided")]
    Missing(&'static str),

    #[error("{key:?} is malformed: {reason}")]
    MalformedUrl { key: &'static str, reason: String },

    #[error("{0:?} is malformed: invalid scheme; must be http(s)")]
    InvalidScheme(&'static str),

    #[error("\"ADDR\" is malformed: {0}")]
    BindAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("timeouts.handler_secs ({handler_secs}s) cannot cover the retry budget ({budget_ms}ms)")]
    HandlerBudget { handler_secs: u64, budget_ms: u64 },
}

/// Validate the whole configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = normalize_bind_address(&config.listener.bind_address) {
        errors.push(e);
    }

    for (key, raw) in config.upstreams.entries() {
        if let Err(e) = normalize_base_url(key, raw) {
            errors.push(e);
        }
    }

    if let Err(e) = parse_target_url("HERE_AUTOCOMPLETE_URL", &config.here.autocomplete_url) {
        errors.push(e);
    }
    if let Err(e) = parse_target_url("HERE_LOOKUP_URL", &config.here.lookup_url) {
        errors.push(e);
    }
    if config.here.api_key.is_empty() {
        errors.push(ValidationError::Missing("HERE_KEY"));
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::Zero("retries.max_attempts"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.timeouts.handler_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.handler_secs"));
    } else {
        let budget_ms = retry_budget_ms(config);
        if config.timeouts.handler_secs.saturating_mul(1000) < budget_ms {
            errors.push(ValidationError::HandlerBudget {
                handler_secs: config.timeouts.handler_secs,
                budget_ms,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Worst-case time the forwarder may spend on one request: every attempt
/// running to its deadline plus the longest jittered delay between attempts.
pub fn retry_budget_ms(config: &GatewayConfig) -> u64 {
    let attempts = u64::from(config.retries.max_attempts.max(1));
    let per_attempt = config.timeouts.request_secs.saturating_mul(1000);
    let delays = if config.retries.base_delay_ms == 0 {
        0
    } else {
        let longest = config.retries.max_delay_ms.saturating_add(config.retries.max_delay_ms / 10);
        (attempts - 1).saturating_mul(longest)
    };
    attempts.saturating_mul(per_attempt).saturating_add(delays)
}

/// Parse an upstream base URL and keep only scheme, host and port.
///
/// Path, query, fragment and user info are discarded; the path is forced to `/`.
pub fn normalize_base_url(key: &'static str, raw: &str) -> Result<Url, ValidationError> {
    let mut url = parse_target_url(key, raw)?;
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    // Only fails for URLs that cannot carry credentials, which http(s) always can.
    let _ = url.set_username("");
    let _ = url.set_password(None);
    Ok(url)
}

/// Parse an absolute http(s) URL, keeping its path.
pub fn parse_target_url(key: &'static str, raw: &str) -> Result<Url, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Missing(key));
    }

    let url = Url::parse(raw).map_err(|e| ValidationError::MalformedUrl {
        key,
        reason: e.to_string(),
    })?;

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::MalformedUrl {
            key,
            reason: "not a url".to_string(),
        });
    }

    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ValidationError::InvalidScheme(key)),
    }
}

/// Check a `host:port` bind address. An empty host means all interfaces.
pub fn normalize_bind_address(raw: &str) -> Result<String, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Missing("ADDR"));
    }

    let (host, port) = raw
        .rsplit_once(':')
        .ok_or_else(|| ValidationError::BindAddress(format!("missing port in address {raw:?}")))?;

    port.parse::<u16>()
        .map_err(|_| ValidationError::BindAddress(format!("invalid port {port:?}")))?;

    let host = if host.is_empty() { "0.0.0.0" } else { host };
    if host.contains(':') && !(host.starts_with('[') && host.ends_with(']')) {
        return Err(ValidationError::BindAddress(format!(
            "too many colons in address {raw:?}"
        )));
    }

    Ok(format!("{host}:{port}"))
}
