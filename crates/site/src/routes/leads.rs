//! Lead capture.

use axum::{extract::State, http::StatusCode, Json};
use site_contract::{LeadRequest, StatusResponse};

use crate::{
    error::ApiError,
    store::{now_timestamp, NewLead},
    AppState,
};

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `POST /api/leads`.
pub async fn create_lead(
    State(state): State<AppState>,
    Json(request): Json<LeadRequest>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    let (Some(name), Some(email), Some(company)) = (
        non_blank(request.name),
        non_blank(request.email),
        non_blank(request.company),
    ) else {
        return Err(ApiError::BadRequest(
            "Name, email, and company are required".to_string(),
        ));
    };

    let id = state.store.insert_lead(&NewLead {
        session_id: request.session_id.map(|id| id.as_str().to_string()),
        name,
        email,
        company,
        project_type: non_blank(request.project_type),
        budget: non_blank(request.budget),
        created_at: now_timestamp(),
    })?;
    tracing::info!(lead_id = id, "lead captured");
    Ok((StatusCode::CREATED, Json(StatusResponse::new("lead captured"))))
}
