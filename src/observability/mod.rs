//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy handler and forwarder produce:
//!     → logging.rs (JSON log events: app, host, url | error)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log file (IFACER_LOG/proxy.log) or stderr
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID recorded on every request span
//! - Metrics are cheap and off unless enabled

pub mod logging;
pub mod metrics;
