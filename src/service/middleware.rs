//! Service middleware for request metrics and `user` cookie consistency.

use axum::{
    extract::{Request, State},
    http::header::{COOKIE, SET_COOKIE},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{info, warn};

use crate::session::CookieCheck;
use crate::store::WikiStore;
use crate::types::{find_cookie, USER_COOKIE};

use super::routes::session_from_headers;
use super::state::ServiceState;

/// Metrics middleware that records request counts and latency.
///
/// Emits one `request_metric` event per request; aggregate from logs.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "social_wiki::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

/// Replace UUIDs and numeric segments so metrics stay low-cardinality.
fn normalize_path(path: &str) -> String {
    static UUID: OnceLock<regex_lite::Regex> = OnceLock::new();
    static NUMBER: OnceLock<regex_lite::Regex> = OnceLock::new();

    let uuid = UUID.get_or_init(|| {
        regex_lite::Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
            .expect("uuid pattern is valid")
    });
    let number = NUMBER.get_or_init(|| {
        regex_lite::Regex::new(r"/-?[0-9]+(/|$)").expect("number pattern is valid")
    });

    let path = uuid.replace_all(path, ":id");
    number.replace_all(&path, "/:id$1").to_string()
}

/// Compare the `user` cookie with the session on every request.
///
/// A mismatch appends a clearing `user` cookie to the response; the session
/// stays open and the request proceeds.
pub async fn user_cookie_guard<S: WikiStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    request: Request,
    next: Next,
) -> Response {
    let session = session_from_headers(&state, request.headers());
    let user_cookie = request
        .headers()
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| find_cookie(h, USER_COOKIE))
        .map(str::to_string);

    let check = state.wiki.sessions().validate_cookie(session.as_ref(), user_cookie.as_deref());
    let mut response = next.run(request).await;

    if let CookieCheck::Tampered { clear } = check {
        match HeaderValue::from_str(&clear.to_header_value()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!(error = %e, "Could not encode clearing cookie"),
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_replaces_uuid() {
        let path = "/api/session/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/session/:id");
    }

    #[test]
    fn test_normalize_path_replaces_numbers() {
        assert_eq!(normalize_path("/pages/42"), "/pages/:id");
        assert_eq!(normalize_path("/pages/42/history"), "/pages/:id/history");
    }

    #[test]
    fn test_normalize_path_preserves_regular_path() {
        assert_eq!(normalize_path("/retrieveWikiPage"), "/retrieveWikiPage");
        assert_eq!(normalize_path("/health/ready"), "/health/ready");
    }
}
