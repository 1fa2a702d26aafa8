//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (one task per connection, axum::serve)
//!     → server.rs (Axum setup, middleware, dispatch)
//!     → request.rs (request ID)
//!     → `/`        → discovery.rs (route listing, CORS)
//!     → `/<name>/…` → routing::RouteTable lookup + rewrite
//!                 → forward.rs (buffer body, retry transport failures)
//!                 → client.rs (shared hyper-util client, raw outbound uri)
//!                 → response.rs (status, headers, streamed body)
//!     → Send to caller
//! ```

pub mod client;
pub mod discovery;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{ForwardError, Forwarder, OutboundRequest, Transport, TransportError};
pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, GatewayServer, StartupError};
