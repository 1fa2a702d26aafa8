//! Shared upstream HTTP client.
//!
//! One hyper-util client is built at startup and reused by every request.
//! It never follows redirects and keeps no idle connections, so each call
//! opens its own connection to the upstream. Plain `http` and `https`
//! upstreams go through the same rustls-backed connector.
//!
//! # Design Decisions
//! - The outbound [`Uri`](axum::http::Uri) is sent as built; nothing re-encodes
//!   the caller's path or query on the way out
//! - One deadline per attempt covers connecting, the response headers and the
//!   whole response body

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use hyper::body::{Body as HttpBody, Frame, Incoming, SizeHint};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Instant, Sleep};

use crate::config::TimeoutConfig;
use crate::http::forward::{OutboundRequest, Transport, TransportError};

/// [`Transport`] backed by the hyper-util legacy client.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    request_timeout: Duration,
}

impl HyperTransport {
    /// Build the client: connect timeout on the TCP connector, no pooled
    /// connections, per-attempt deadline applied in [`Transport::send`].
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(connector);

        Self {
            client,
            request_timeout: Duration::from_secs(timeouts.request_secs),
        }
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<Response<Body>, TransportError> {
        let mut outbound = Request::new(Body::from(request.body.clone()));
        *outbound.method_mut() = request.method.clone();
        *outbound.uri_mut() = request.uri.clone();
        *outbound.headers_mut() = request.headers.clone();

        let deadline = Instant::now() + self.request_timeout;
        let upstream = tokio::time::timeout_at(deadline, self.client.request(outbound))
            .await
            .map_err(|_| {
                TransportError::Timeout(format!(
                    "no response within {:?}",
                    self.request_timeout
                ))
            })?
            .map_err(classify)?;

        Ok(upstream.map(|body| {
            Body::new(DeadlineBody {
                inner: Box::pin(body),
                deadline: Box::pin(tokio::time::sleep_until(deadline)),
            })
        }))
    }
}

fn classify(error: hyper_util::client::legacy::Error) -> TransportError {
    if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Other(error.to_string())
    }
}

/// Upstream body that fails once the attempt's deadline passes.
///
/// Frames are passed through without buffering; dropping it drops the
/// upstream connection.
struct DeadlineBody {
    inner: Pin<Box<Incoming>>,
    deadline: Pin<Box<Sleep>>,
}

impl HttpBody for DeadlineBody {
    type Data = Bytes;
    type Error = TransportError;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, TransportError>>> {
        if self.deadline.as_mut().poll(cx).is_ready() {
            return Poll::Ready(Some(Err(TransportError::Timeout(
                "upstream body not finished before the deadline".into(),
            ))));
        }
        self.inner
            .as_mut()
            .poll_frame(cx)
            .map_err(|e| TransportError::Other(e.to_string()))
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, Method, StatusCode};
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn timeouts(request_secs: u64) -> TimeoutConfig {
        TimeoutConfig {
            request_secs,
            connect_secs: 2,
            handler_secs: 30,
        }
    }

    /// Serve one connection: capture the raw request head, answer with `response`.
    async fn one_shot_backend(
        response: &'static str,
    ) -> (SocketAddr, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });
        (addr, handle)
    }

    fn get(addr: SocketAddr, path_and_query: &str) -> OutboundRequest {
        OutboundRequest::new(
            Method::GET,
            format!("http://{addr}{path_and_query}").parse().unwrap(),
            &HeaderMap::new(),
            Bytes::new(),
        )
    }

    #[tokio::test]
    async fn test_request_target_sent_as_built() {
        let (addr, seen) =
            one_shot_backend("HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n").await;
        let transport = HyperTransport::new(&timeouts(5));

        let response = transport
            .send(&get(addr, "/people?name=O'Brien&tag=a|b"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let head = seen.await.unwrap();
        assert!(
            head.starts_with("GET /people?name=O'Brien&tag=a|b HTTP/1.1\r\n"),
            "unexpected request head: {head}"
        );
    }

    #[tokio::test]
    async fn test_refused_connection_is_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HyperTransport::new(&timeouts(5));
        let Err(err) = transport.send(&get(addr, "/")).await else {
            panic!("expected a transport error");
        };
        assert_eq!(err.kind(), "connect");
    }

    #[tokio::test]
    async fn test_silent_upstream_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(socket);
        });

        let transport = HyperTransport::new(&timeouts(1));
        let Err(err) = transport.send(&get(addr, "/")).await else {
            panic!("expected a transport error");
        };
        assert_eq!(err.kind(), "timeout");
    }
}
