//! HTTP reverse-proxy gateway for the Interfacer services.
//!
//! Requests to `/<name>/…` are forwarded to the upstream registered under
//! `name`; `/` lists the registered names.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use routing::RouteTable;
