//! Session creation and command telemetry.

use axum::{extract::State, Json};
use site_contract::{CreateSessionResponse, SessionId, StatusResponse, TrackCommandRequest};
use uuid::Uuid;

use crate::{error::ApiError, store::now_timestamp, AppState};

/// `POST /api/research/session/create`.
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let id = Uuid::new_v4().to_string();
    state.store.create_session(&id, &now_timestamp())?;
    tracing::debug!(session_id = %id, "session created");
    Ok(Json(CreateSessionResponse {
        session_id: SessionId::new(id),
    }))
}

/// `POST /api/research/behavioral/track`.
pub async fn track_command(
    State(state): State<AppState>,
    Json(request): Json<TrackCommandRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let (Some(session_id), Some(command)) = (request.session_id, request.command) else {
        return Err(ApiError::BadRequest(
            "sessionId and command are required".to_string(),
        ));
    };
    if session_id.as_str().is_empty() || command.is_empty() {
        return Err(ApiError::BadRequest(
            "sessionId and command are required".to_string(),
        ));
    }
    state
        .store
        .log_command(session_id.as_str(), &command, &now_timestamp())?;
    Ok(Json(StatusResponse::new("logged")))
}
