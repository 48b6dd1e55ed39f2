//! Admin login and read-only listings.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    Json,
};
use site_contract::{AdminLoginRequest, CommandLogRecord, LeadRecord, SessionRecord, StatusResponse};

use crate::{error::ApiError, AppState};

/// `POST /api/admin/login`.
pub async fn login(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Json(request): Json<AdminLoginRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let client = connect_info.map(|ConnectInfo(addr)| addr.ip());
    state.gate.check(client, &request.password)?;
    tracing::info!("admin login accepted");
    Ok(Json(StatusResponse::new("ok")))
}

/// `GET /api/admin/leads`.
pub async fn leads(State(state): State<AppState>) -> Result<Json<Vec<LeadRecord>>, ApiError> {
    Ok(Json(state.store.list_leads()?))
}

/// `GET /api/admin/logs`.
pub async fn logs(
    State(state): State<AppState>,
) -> Result<Json<Vec<CommandLogRecord>>, ApiError> {
    Ok(Json(state.store.list_command_logs()?))
}

/// `GET /api/admin/sessions`.
pub async fn sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionRecord>>, ApiError> {
    Ok(Json(state.store.list_sessions()?))
}
