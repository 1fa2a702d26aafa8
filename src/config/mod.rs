//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment (ADDR, *_URL, HERE_KEY, IFACER_LOG)
//!   or config file (TOML, --config)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks, collect all errors)
//!     → loader.rs (normalize base URLs to scheme://host/)
//!     → GatewayConfig (validated, immutable)
//!     → routing::RouteTable built once from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All tunables have defaults; only addresses, URLs and the API key are required
//! - Any error is fatal at startup and never surfaces at request time

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    CorsConfig, GatewayConfig, HereConfig, LimitsConfig, ListenerConfig, ObservabilityConfig,
    RetryConfig, TimeoutConfig, UpstreamConfig,
};
