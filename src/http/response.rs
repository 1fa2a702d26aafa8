//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay the upstream status, headers and body to the caller
//! - Add permissive CORS headers on discovery and failure responses
//! - Map forwarding failures to plain-text 5xx responses
//!
//! # Design Decisions
//! - The upstream status is always copied explicitly; nothing falls back to 200
//! - Headers are appended one value at a time so repeated names stay separate
//! - Streaming responses avoid buffering entire body; when the caller goes
//!   away hyper drops the body, which drops the upstream stream with it

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};

/// Methods advertised in `access-control-allow-methods`.
pub const CORS_ALLOW_METHODS: &str = "POST, GET, DELETE, PUT, OPTIONS, PATCH";

const CORS_HEADERS: [(header::HeaderName, &str); 4] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "false"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, CORS_ALLOW_METHODS),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "*"),
];

/// Set the permissive CORS headers, replacing any existing values.
pub fn apply_cors(headers: &mut HeaderMap) {
    for (name, value) in CORS_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
}

/// Add the CORS headers the upstream did not set itself.
fn apply_missing_cors(headers: &mut HeaderMap) {
    for (name, value) in CORS_HEADERS {
        headers
            .entry(name)
            .or_insert_with(|| HeaderValue::from_static(value));
    }
}

/// Turn an upstream response into the caller's response.
pub fn relay(upstream: Response<Body>, cors: bool) -> Response {
    let (parts, body) = upstream.into_parts();

    let mut response = Response::new(body);
    *response.status_mut() = parts.status;

    let headers = response.headers_mut();
    for (name, value) in &parts.headers {
        headers.append(name.clone(), value.clone());
    }
    if cors {
        apply_missing_cors(headers);
    }

    response
}

/// The outbound request could not be constructed.
pub fn construction_failure() -> Response {
    with_cors((
        StatusCode::SERVICE_UNAVAILABLE,
        "client: could not create request\n",
    ))
}

/// Every attempt against the upstream of `route` failed.
///
/// Preflight requests still get "no content" so browsers do not report a
/// CORS failure instead of the real one on the follow-up request.
pub fn upstream_failure(route: &str, method: &Method) -> Response {
    if method == Method::OPTIONS {
        return with_cors(StatusCode::NO_CONTENT);
    }
    with_cors((
        StatusCode::SERVICE_UNAVAILABLE,
        format!("client: error making http request to {route}\n"),
    ))
}

/// No route owns the request path.
pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 page not found\n").into_response()
}

fn with_cors(response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    apply_cors(response.headers_mut());
    response
}
