use crate::auth::require_basic_auth;
use crate::config::{Credentials, RelayConfig};
use crate::error::RelayError;
use crate::logging::SharedLogger;
use crate::relay::{self, Failed};
use crate::translate::relay_types::ErrorResponse;

use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Read-only state shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub config: RelayConfig,
    pub credentials: Credentials,
    pub client: reqwest::Client,
    pub logger: SharedLogger,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/translate", post(handle_translate))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_translate(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let logger = state.logger.for_request(request_id);

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            logger.warn("server", format!("Rejected body: {}", rejection.body_text()));
            let err = ErrorResponse::new("Failed to read request body")
                .with_details(rejection.body_text());
            return with_request_id((rejection.status(), Json(err)).into_response(), request_id);
        }
    };

    logger.info("server", format!("Request: POST /translate body_len={}", body.len()));

    let response = match relay::translate(
        &body,
        &state.config,
        &state.credentials,
        &state.client,
        &logger,
    )
    .await
    {
        Ok(result) => {
            logger.info("server", "Responded: 200");
            Json(result).into_response()
        }
        Err(Failed { phase, error }) => {
            let status = error.status();
            logger.error(
                "server",
                format!("Failed({}) in {}: {}", error.kind(), phase, error),
            );
            (status, Json(error_body(&error))).into_response()
        }
    };

    with_request_id(response, request_id)
}

fn with_request_id(mut response: Response, request_id: Uuid) -> Response {
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

/// Shape a failed request into the relay's error envelope.
pub fn error_body(error: &RelayError) -> ErrorResponse {
    match error {
        RelayError::InvalidInputFormat { message, details } => {
            ErrorResponse::new(message.as_str()).with_details(details.as_str())
        }
        RelayError::MissingInput { message } => ErrorResponse::new(message.as_str()),
        other => ErrorResponse::translation_failed(other.to_string()),
    }
}

async fn handle_health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}
