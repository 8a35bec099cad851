//! Publish endpoint.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use beatpub_core::{PublishBeatPayload, PublishOutcome};
use serde::Serialize;
use tracing::{error, info};

use super::middleware::AuthCaller;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub status: String,
    pub message: String,
    pub song_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// POST /api/v1/beats/publish
///
/// The publish runs on its own task so that a client hanging up mid-request
/// cannot cut the orchestrator's cleanup short.
pub async fn publish_beat(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Json(payload): Json<PublishBeatPayload>,
) -> Response {
    info!(caller = %caller, title = ?payload.title, "Publish requested");

    let orchestrator = Arc::clone(state.orchestrator());
    let outcome = match tokio::spawn(async move { orchestrator.handle_publish(payload).await })
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Publish task aborted");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unexpected error while publishing".to_string(),
            );
        }
    };

    outcome_response(outcome)
}

/// Map a publish outcome onto the wire contract.
pub fn outcome_response(outcome: PublishOutcome) -> Response {
    match outcome {
        PublishOutcome::Success {
            message,
            external_id,
        } => (
            StatusCode::OK,
            Json(PublishResponse {
                status: "success".to_string(),
                message,
                song_id: external_id.unwrap_or_default(),
            }),
        )
            .into_response(),
        PublishOutcome::Failure { reason, message } => {
            let status = if reason.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            error_response(status, message)
        }
    }
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}
