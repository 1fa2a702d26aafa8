//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream call (http::forward):
//!     → client timeouts (connect + overall per attempt, set on the shared client)
//!     → On transport failure: retries.rs (attempt bound)
//!     → backoff.rs (optional jittered delay between attempts)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - Upstream statuses are never retried, only transport failures
//! - Retries replay a buffered body, never a half-drained stream

pub mod backoff;
pub mod retries;

pub use retries::RetryPolicy;
