//! HTTP Basic authentication for the translation route.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;

use crate::config::BasicCredentials;
use crate::logging::LogLevel;
use crate::server::AppState;
use crate::translate::relay_types::ErrorResponse;

pub const REALM: &str = "arabic-relay";

/// Decode an `Authorization: Basic ...` header value into `(username, password)`.
pub fn parse_basic(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

fn is_authorized(headers: &HeaderMap, expected: &BasicCredentials) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic)
        .is_some_and(|(user, pass)| {
            // Evaluate both so a wrong username costs the same as a wrong password.
            let user_ok = constant_time_eq(user.as_bytes(), expected.username.as_bytes());
            let pass_ok = constant_time_eq(pass.as_bytes(), expected.password.as_bytes());
            user_ok & pass_ok
        })
}

/// Byte comparison whose running time depends only on the lengths.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Rejects requests without the configured credentials before any upstream work.
/// A no-op when basic auth is disabled.
pub async fn require_basic_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.credentials.basic_auth.as_ref() else {
        return next.run(request).await;
    };

    if is_authorized(request.headers(), expected) {
        return next.run(request).await;
    }

    let offered = request
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

    tracing::warn!(authorization = ?offered, "Unauthorized request to {}", request.uri().path());
    state.logger.log_with_context(
        LogLevel::Warn,
        "auth",
        format!("Unauthorized request to {}", request.uri().path()),
        serde_json::json!({ "authorization": offered }),
    );

    unauthorized()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, format!("Basic realm=\"{REALM}\""))],
        Json(ErrorResponse::unauthorized()),
    )
        .into_response()
}
