//! Route handlers grouped by resource.

pub mod admin;
pub mod files;
pub mod leads;
pub mod session;

use axum::Json;
use site_contract::StatusResponse;

/// `GET /api/health`.
pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse::new("ok"))
}
