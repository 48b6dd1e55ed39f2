//! Upload gateway: uploads, listings, signed downloads, and deletion.

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use site_contract::{
    DashboardSummary, FileListResponse, FileSummary, RecentFile, StatusResponse, UploadResponse,
};
use uuid::Uuid;

use crate::{
    blob::upload_path,
    error::ApiError,
    store::{now_timestamp, FileRecord},
    AppState,
};

/// Files listed by the dashboard.
pub const DASHBOARD_RECENT: usize = 5;

const FALLBACK_MIME: &str = "application/octet-stream";

struct PendingUpload {
    filename: String,
    mimetype: String,
    bytes: Bytes,
}

fn bad_multipart(err: impl std::fmt::Display) -> ApiError {
    ApiError::BadRequest(format!("invalid multipart body: {err}"))
}

/// `POST /api/upload`.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut session_id = None;
    let mut pending = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "sessionId" => session_id = Some(field.text().await.map_err(bad_multipart)?),
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let mimetype = field.content_type().unwrap_or(FALLBACK_MIME).to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                pending.push(PendingUpload {
                    filename,
                    mimetype,
                    bytes,
                });
            }
            other => tracing::debug!(field = other, "ignoring multipart field"),
        }
    }

    if pending.is_empty() {
        return Err(ApiError::BadRequest("file required".to_string()));
    }
    let session_id = session_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("sessionId required".to_string()))?;

    let mut stored = Vec::with_capacity(pending.len());
    for upload in &pending {
        let id = Uuid::new_v4().to_string();
        let record = FileRecord {
            blob_path: upload_path(&session_id, &id, &upload.filename),
            id,
            session_id: session_id.clone(),
            filename: upload.filename.clone(),
            mimetype: upload.mimetype.clone(),
            size: upload.bytes.len() as u64,
            uploaded_at: now_timestamp(),
        };
        if let Err(err) = store_upload(&state, &record, &upload.bytes) {
            discard_uploads(&state, &stored);
            return Err(err);
        }
        stored.push(record);
    }

    tracing::info!(session_id = %session_id, count = pending.len(), "files uploaded");
    Ok(Json(UploadResponse {
        status: "uploaded".to_string(),
        count: pending.len(),
    }))
}

fn store_upload(state: &AppState, record: &FileRecord, bytes: &[u8]) -> Result<(), ApiError> {
    state.blobs.put(&record.blob_path, bytes)?;
    if let Err(err) = state.store.insert_file(record) {
        if let Err(cleanup) = state.blobs.delete(&record.blob_path) {
            tracing::warn!(blob_path = %record.blob_path, error = %cleanup, "orphaned upload blob");
        }
        return Err(err.into());
    }
    Ok(())
}

/// Undoes the earlier files of a request that failed partway.
fn discard_uploads(state: &AppState, stored: &[FileRecord]) {
    for record in stored {
        if let Err(err) = state.store.delete_file(&record.id) {
            tracing::warn!(file_id = %record.id, error = %err, "failed to discard upload record");
        }
        if let Err(err) = state.blobs.delete(&record.blob_path) {
            tracing::warn!(blob_path = %record.blob_path, error = %err, "failed to discard upload blob");
        }
    }
}

/// `GET /api/files`.
pub async fn list_files(State(state): State<AppState>) -> Result<Json<FileListResponse>, ApiError> {
    let files = state
        .store
        .list_files()?
        .into_iter()
        .map(|record| FileSummary {
            id: record.id,
            filename: record.filename,
            size: record.size,
            upload_date: record.uploaded_at,
        })
        .collect();
    Ok(Json(FileListResponse { files }))
}

fn file_or_404(state: &AppState, id: &str) -> Result<FileRecord, ApiError> {
    state
        .store
        .get_file(id)?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))
}

/// `GET /api/files/:id`: redirects to a signed blob URL.
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = file_or_404(&state, &id)?;
    let url = state
        .signer
        .signed_url(&record.blob_path, chrono::Utc::now().timestamp());
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]))
}

/// Query of a signed blob URL.
#[derive(Debug, Deserialize)]
pub struct BlobQuery {
    expires: Option<String>,
    signature: Option<String>,
}

/// `GET /api/blobs/*path`: serves bytes behind a valid signature.
pub async fn blob(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<BlobQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let expires = query
        .expires
        .and_then(|raw| raw.parse::<i64>().ok())
        .ok_or(ApiError::Forbidden)?;
    let signature = query.signature.ok_or(ApiError::Forbidden)?;
    if !state
        .signer
        .verify(&path, expires, &signature, chrono::Utc::now().timestamp())
    {
        return Err(ApiError::Forbidden);
    }
    let bytes = state.blobs.get(&path)?;
    let mimetype = state
        .store
        .find_file_by_blob_path(&path)?
        .map(|record| record.mimetype)
        .unwrap_or_else(|| FALLBACK_MIME.to_string());
    Ok(([(header::CONTENT_TYPE, mimetype)], bytes))
}

/// `DELETE /api/files/:id`: removes the blob when the record exists, then the record.
///
/// Deleting an unknown id succeeds.
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let record = state
        .store
        .get_file(&id)
        .map_err(|err| ApiError::internal("failed to delete file", err))?;
    if let Some(record) = record {
        state
            .blobs
            .delete(&record.blob_path)
            .map_err(|err| ApiError::internal("failed to delete file", err))?;
    }
    state
        .store
        .delete_file(&id)
        .map_err(|err| ApiError::internal("failed to delete file", err))?;
    tracing::info!(file_id = %id, "file deleted");
    Ok(Json(StatusResponse::new("deleted")))
}

/// `GET /api/dashboard`.
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardSummary>, ApiError> {
    let files = state.store.list_files()?;
    Ok(Json(DashboardSummary {
        total_files: files.len() as u64,
        total_size: files.iter().map(|record| record.size).sum(),
        files: files
            .into_iter()
            .take(DASHBOARD_RECENT)
            .map(|record| RecentFile {
                filename: record.filename,
                size: record.size,
            })
            .collect(),
    }))
}
