//! Configuration loading from the environment or from disk.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{
    normalize_base_url, normalize_bind_address, validate_config, ValidationError,
};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;
    finalize(config)
}

/// Load and validate configuration from the process environment.
pub fn load_from_env() -> Result<GatewayConfig, ConfigError> {
    load_from_lookup(|key| std::env::var(key).ok())
}

/// Build configuration from an arbitrary key lookup.
///
/// Keys: `ADDR`, `ZENFLOWS_URL`, `INBOX_URL`, `WALLET_URL`, `OSH_URL`,
/// `HERE_KEY`, and optionally `HERE_AUTOCOMPLETE_URL`, `HERE_LOOKUP_URL`,
/// `IFACER_LOG`.
pub fn load_from_lookup<F>(lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = GatewayConfig::default();
    let var = |key: &str| lookup(key).unwrap_or_default();

    config.listener.bind_address = var("ADDR");
    config.upstreams.zenflows_url = var("ZENFLOWS_URL");
    config.upstreams.inbox_url = var("INBOX_URL");
    config.upstreams.wallet_url = var("WALLET_URL");
    config.upstreams.osh_url = var("OSH_URL");
    config.here.api_key = var("HERE_KEY");

    if let Some(url) = lookup("HERE_AUTOCOMPLETE_URL") {
        config.here.autocomplete_url = url;
    }
    if let Some(url) = lookup("HERE_LOOKUP_URL") {
        config.here.lookup_url = url;
    }
    config.observability.log_dir = lookup("IFACER_LOG")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from);

    finalize(config)
}

/// Validate, then rewrite addresses and base URLs into their normalized form.
fn finalize(mut config: GatewayConfig) -> Result<GatewayConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;

    let single = |e: ValidationError| ConfigError::Validation(vec![e]);
    config.listener.bind_address =
        normalize_bind_address(&config.listener.bind_address).map_err(single)?;

    let upstreams = &mut config.upstreams;
    upstreams.zenflows_url = normalize_base_url("ZENFLOWS_URL", &upstreams.zenflows_url)
        .map_err(single)?
        .into();
    upstreams.inbox_url = normalize_base_url("INBOX_URL", &upstreams.inbox_url)
        .map_err(single)?
        .into();
    upstreams.wallet_url = normalize_base_url("WALLET_URL", &upstreams.wallet_url)
        .map_err(single)?
        .into();
    upstreams.osh_url = normalize_base_url("OSH_URL", &upstreams.osh_url)
        .map_err(single)?
        .into();

    Ok(config)
}
