//! Upstream forwarding.
//!
//! # Responsibilities
//! - Build the outbound request from the inbound one and the rewritten URL
//! - Execute it through a [`Transport`] with a bounded number of attempts
//! - Separate construction failures (never retried) from transport failures
//!
//! # Design Decisions
//! - The body is buffered by the caller before the first attempt; every attempt
//!   sends the same bytes
//! - Any upstream status, 5xx included, ends the loop and is relayed as-is
//! - `Transport` is the seam between forwarding policy and the HTTP client

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Response, Uri};
use std::sync::Arc;
use thiserror::Error;

use crate::observability::metrics;
use crate::resilience::RetryPolicy;

/// Failure of a single attempt against an upstream.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be constructed; retrying cannot help.
    #[error("could not create request: {0}")]
    Build(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Build(_) => "build",
            Self::Connect(_) => "connect",
            Self::Timeout(_) => "timeout",
            Self::Other(_) => "other",
        }
    }
}

/// Outcome of a failed forward.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("client: could not create request: {0}")]
    Build(String),

    #[error("client: error making http request after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: TransportError,
    },
}

impl ForwardError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Build(_) => "build",
            Self::Exhausted { source, .. } => source.kind(),
        }
    }
}

/// Everything needed to (re)send one upstream call.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl OutboundRequest {
    /// Copy the inbound headers, minus those the client derives from the
    /// outbound URI and body (`Host`, `Content-Length`, `Transfer-Encoding`).
    pub fn new(method: Method, uri: Uri, inbound_headers: &HeaderMap, body: Bytes) -> Self {
        let mut headers = HeaderMap::with_capacity(inbound_headers.len());
        for (name, value) in inbound_headers {
            if name == header::HOST
                || name == header::CONTENT_LENGTH
                || name == header::TRANSFER_ENCODING
            {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }

        Self {
            method,
            uri,
            headers,
            body,
        }
    }
}

/// Sends one outbound request and hands back the upstream response with a
/// streaming body.
///
/// Implementations must be safe to share across all in-flight requests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &OutboundRequest) -> Result<Response<Body>, TransportError>;
}

/// Retrying executor around a shared [`Transport`].
#[derive(Clone)]
pub struct Forwarder {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl Forwarder {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Execute `request` for route `route`, retrying transport failures.
    pub async fn execute(
        &self,
        route: &str,
        request: &OutboundRequest,
    ) -> Result<Response<Body>, ForwardError> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            match self.transport.send(request).await {
                Ok(response) => return Ok(response),
                Err(TransportError::Build(reason)) => return Err(ForwardError::Build(reason)),
                Err(error) if self.policy.should_retry(attempt) => {
                    let delay = self.policy.delay(attempt);
                    tracing::warn!(
                        app = %route,
                        url = %request.uri,
                        attempt,
                        delay = ?delay,
                        error = %error,
                        "Retrying after transport error"
                    );
                    metrics::record_retry(route);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(error) => {
                    return Err(ForwardError::Exhausted {
                        attempts: attempt,
                        source: error,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Fails the first `failures` calls, then answers with `status`.
    struct FlakyTransport {
        failures: u32,
        status: StatusCode,
        calls: AtomicU32,
        bodies: Mutex<Vec<Bytes>>,
    }

    impl FlakyTransport {
        fn new(failures: u32, status: StatusCode) -> Arc<Self> {
            Arc::new(Self {
                failures,
                status,
                calls: AtomicU32::new(0),
                bodies: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn send(&self, request: &OutboundRequest) -> Result<Response<Body>, TransportError> {
            self.bodies.lock().unwrap().push(request.body.clone());
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(TransportError::Connect("connection refused".into()));
            }
            let mut response = Response::new(Body::empty());
            *response.status_mut() = self.status;
            Ok(response)
        }
    }

    struct BrokenBuilder;

    #[async_trait]
    impl Transport for BrokenBuilder {
        async fn send(&self, _: &OutboundRequest) -> Result<Response<Body>, TransportError> {
            Err(TransportError::Build("bad header".into()))
        }
    }

    fn request(body: &'static [u8]) -> OutboundRequest {
        OutboundRequest::new(
            Method::POST,
            Uri::from_static("http://upstream/x"),
            &HeaderMap::new(),
            Bytes::from_static(body),
        )
    }

    #[tokio::test]
    async fn test_succeeds_iff_failures_below_bound() {
        for k in 0..=4u32 {
            let transport = FlakyTransport::new(k, StatusCode::OK);
            let forwarder = Forwarder::new(transport.clone(), RetryPolicy::immediate(3));

            let result = forwarder.execute("zenflows", &request(b"")).await;

            if k < 3 {
                assert_eq!(result.unwrap().status(), StatusCode::OK, "k = {k}");
                assert_eq!(transport.calls.load(Ordering::SeqCst), k + 1);
            } else {
                match result {
                    Err(ForwardError::Exhausted { attempts, .. }) => assert_eq!(attempts, 3),
                    Err(other) => panic!("k = {k}: expected exhaustion, got {other}"),
                    Ok(response) => panic!("k = {k}: unexpected {}", response.status()),
                }
                assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
            }
        }
    }

    #[tokio::test]
    async fn test_upstream_error_status_not_retried() {
        let transport = FlakyTransport::new(0, StatusCode::SERVICE_UNAVAILABLE);
        let forwarder = Forwarder::new(transport.clone(), RetryPolicy::immediate(3));

        let response = forwarder.execute("inbox", &request(b"")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_resend_identical_body() {
        let transport = FlakyTransport::new(2, StatusCode::CREATED);
        let forwarder = Forwarder::new(transport.clone(), RetryPolicy::immediate(3));

        forwarder.execute("wallet", &request(b"{\"amount\":1}")).await.unwrap();
        let bodies = transport.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 3);
        assert!(bodies.iter().all(|b| b.as_ref() == b"{\"amount\":1}"));
    }

    #[tokio::test]
    async fn test_build_error_not_retried() {
        let forwarder = Forwarder::new(Arc::new(BrokenBuilder), RetryPolicy::immediate(3));
        let err = forwarder.execute("osh", &request(b"")).await.unwrap_err();
        assert!(matches!(err, ForwardError::Build(_)));
        assert_eq!(err.kind(), "build");
    }

    #[test]
    fn test_outbound_headers_copied_except_framing() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::HOST, HeaderValue::from_static("gateway.local"));
        inbound.insert(header::CONTENT_LENGTH, HeaderValue::from_static("3"));
        inbound.append(header::ACCEPT, HeaderValue::from_static("text/html"));
        inbound.append(header::ACCEPT, HeaderValue::from_static("application/json"));
        inbound.insert("x-custom", HeaderValue::from_static("1"));

        let outbound = OutboundRequest::new(
            Method::GET,
            Uri::from_static("http://upstream/"),
            &inbound,
            Bytes::new(),
        );

        assert!(outbound.headers.get(header::HOST).is_none());
        assert!(outbound.headers.get(header::CONTENT_LENGTH).is_none());
        assert_eq!(outbound.headers.get_all(header::ACCEPT).iter().count(), 2);
        assert_eq!(outbound.headers["x-custom"], "1");
    }
}
