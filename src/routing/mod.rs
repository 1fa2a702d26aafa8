//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query)
//!     → router.rs (route lookup by first path segment)
//!     → matcher.rs (segment extraction, prefix stripping)
//!     → Return: matched Route or NoMatch
//!     → rewrite.rs (Route's RewriteRule builds the outbound URL)
//!
//! Route Compilation (at startup):
//!     GatewayConfig
//!     → normalize upstream base URLs
//!     → fixed route list (passthrough / query-injecting)
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Route names are literal first segments; `/` is reserved for discovery
//! - Rewrite rules are plain data, testable without a server

pub mod matcher;
pub mod rewrite;
pub mod router;

pub use rewrite::{RewriteError, RewriteRule};
pub use router::{Route, RouteTable, RouteTableError};
