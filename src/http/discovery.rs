//! Root path handler listing the configured routes.

use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::response::apply_cors;
use crate::http::server::AppState;
use crate::routing::RouteTable;

/// `/<name>/` per route, one per line, in table order.
pub fn route_listing(routes: &RouteTable) -> String {
    routes
        .routes()
        .iter()
        .map(|route| format!("/{}/\n", route.name))
        .collect()
}

/// `OPTIONS /` gets "no content"; every other method gets the listing.
pub async fn discovery_handler(State(state): State<AppState>, method: Method) -> Response {
    let mut response = if method == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::OK, route_listing(&state.routes)).into_response()
    };
    apply_cors(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Route, RewriteRule};
    use url::Url;

    #[test]
    fn test_route_listing() {
        let base = Url::parse("http://upstream/").unwrap();
        let table = RouteTable::new(vec![
            Route::new("zenflows", RewriteRule::passthrough(base.clone())),
            Route::new("inbox", RewriteRule::passthrough(base)),
        ])
        .unwrap();

        assert_eq!(route_listing(&table), "/zenflows/\n/inbox/\n");
    }
}
