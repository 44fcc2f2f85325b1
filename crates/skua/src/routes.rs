//! HTTP surface for the ingress gate.
//!
//! `POST /` runs the submission sequence: parse, authenticate, validate,
//! enqueue. Every step short-circuits with its own status and a structured
//! JSON error body; only a fully accepted record reaches the queue.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::{Value, json};
use std::time::Instant;
use tracing::{error, info, warn};

use floe_common::emit;

use crate::metrics::{
    AuthFailed, AuthFailure, AuthSucceeded, EnqueueFailed, MessageEnqueued, PayloadAccepted,
    PayloadRejected, RequestCompleted,
};
use crate::state::AppState;
use crate::validate;

/// Build the gate router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(submit))
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
}

/// Handler for `/health`.
async fn health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

/// Handler for `/metrics`.
async fn metrics_endpoint(State(state): State<AppState>) -> String {
    state.metrics.render()
}

/// Handler for `POST /`.
async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let response = handle_submission(&state, payload).await;

    emit!(RequestCompleted {
        status: response.status().as_u16(),
        duration: started.elapsed(),
    });

    response
}

/// The submission sequence. Each step returns its own error response; a
/// record is only enqueued once every step has passed.
async fn handle_submission(
    state: &AppState,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    // 1. The body must be parseable JSON.
    let Ok(Json(body)) = payload else {
        emit!(PayloadRejected {
            reason: "missing_payload"
        });
        return error_response(StatusCode::BAD_REQUEST, "Missing JSON payload");
    };

    // 2. A token must be present.
    let token = body.get("token");
    if validate::is_missing(token) {
        emit!(AuthFailed {
            reason: AuthFailure::MissingToken
        });
        return error_response(StatusCode::UNAUTHORIZED, "Missing token in body");
    }

    // 3. The token must match the cached credential. A non-string token
    //    can never match one.
    let verified = match token.and_then(Value::as_str) {
        Some(candidate) => state.credentials.verify(candidate).await,
        None => Ok(false),
    };
    match verified {
        Ok(true) => emit!(AuthSucceeded),
        Ok(false) => {
            warn!("Rejected submission with invalid token");
            emit!(AuthFailed {
                reason: AuthFailure::InvalidToken
            });
            return error_response(StatusCode::UNAUTHORIZED, "Invalid token");
        }
        Err(e) => {
            error!(error = %e, "Failed to load credential");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    }

    // 4. A data object must be present.
    let data = match body.get("data") {
        Some(value) if !validate::is_missing(Some(value)) => value,
        _ => {
            emit!(PayloadRejected {
                reason: "missing_data"
            });
            return error_response(StatusCode::BAD_REQUEST, "Missing 'data' field in payload");
        }
    };

    // 5. The data object must have the required shape.
    if let Err(rejection) = validate::validate(data) {
        emit!(PayloadRejected {
            reason: rejection.reason()
        });
        return error_response(StatusCode::BAD_REQUEST, &rejection.to_string());
    }
    emit!(PayloadAccepted);

    // 6. Enqueue the record.
    let record = match serde_json::to_vec(data) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "Failed to serialize accepted record");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    match state.queue.send(Bytes::from(record)).await {
        Ok(message_id) => {
            info!(message_id = %message_id, "Message enqueued");
            emit!(MessageEnqueued);
            (
                StatusCode::OK,
                Json(json!({"status": "success", "message_id": message_id})),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to enqueue message");
            emit!(EnqueueFailed);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to queue message")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}
