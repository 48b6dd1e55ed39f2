//! Backend service contract consumed by the terminal engine.

use std::{future::Future, pin::Pin};

use site_contract::{
    AdminTopic, CommandLogRecord, DashboardSummary, FileSummary, LeadRecord, LeadRequest,
    SessionId, SessionRecord, StatusResponse, TrackCommandRequest, UploadResponse,
};
use thiserror::Error;

/// Object-safe boxed future used by [`SiteApi`] async methods.
pub type SiteApiFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Failure of one backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),
    /// The server answered with a non-success status and a JSON error body.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server `error` message.
        message: String,
        /// Optional server `detail`.
        detail: Option<String>,
    },
    /// The response body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Builds a status error without detail.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
            detail: None,
        }
    }

    /// Returns the HTTP status code when the server answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Renders the message shown to terminal users, including server detail when present.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status {
                message,
                detail: Some(detail),
                ..
            } => format!("{message} ({detail})"),
            other => other.to_string(),
        }
    }
}

/// Admin secret presented as a bearer credential on admin-scoped calls.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredential(String);

impl AdminCredential {
    /// Wraps a verified admin password.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the raw secret for transport headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminCredential(<redacted>)")
    }
}

/// One user-selected file queued for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Client file name.
    pub filename: String,
    /// MIME type reported for the part.
    pub mime_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Backend service for sessions, telemetry, uploads, leads, and admin reads.
pub trait SiteApi {
    /// Creates a new visitor session.
    fn create_session<'a>(&'a self) -> SiteApiFuture<'a, Result<SessionId, ApiError>>;

    /// Records one executed command for a session.
    fn track_command<'a>(
        &'a self,
        request: &'a TrackCommandRequest,
    ) -> SiteApiFuture<'a, Result<(), ApiError>>;

    /// Uploads files on behalf of a session.
    fn upload_files<'a>(
        &'a self,
        session_id: &'a SessionId,
        files: &'a [UploadFile],
    ) -> SiteApiFuture<'a, Result<UploadResponse, ApiError>>;

    /// Lists stored files, newest first.
    fn list_files<'a>(
        &'a self,
        credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<Vec<FileSummary>, ApiError>>;

    /// Resolves a time-limited retrieval URL for a file.
    fn file_download_url<'a>(
        &'a self,
        credential: &'a AdminCredential,
        id: &'a str,
    ) -> SiteApiFuture<'a, Result<String, ApiError>>;

    /// Deletes a stored file and its blob.
    fn delete_file<'a>(
        &'a self,
        credential: &'a AdminCredential,
        id: &'a str,
    ) -> SiteApiFuture<'a, Result<StatusResponse, ApiError>>;

    /// Fetches upload totals and the most recent files.
    fn dashboard<'a>(
        &'a self,
        credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<DashboardSummary, ApiError>>;

    /// Verifies an admin password.
    fn admin_login<'a>(&'a self, password: &'a str) -> SiteApiFuture<'a, Result<(), ApiError>>;

    /// Lists captured leads.
    fn admin_leads<'a>(
        &'a self,
        credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<Vec<LeadRecord>, ApiError>>;

    /// Lists tracked commands.
    fn admin_logs<'a>(
        &'a self,
        credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<Vec<CommandLogRecord>, ApiError>>;

    /// Lists known sessions.
    fn admin_sessions<'a>(
        &'a self,
        credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<Vec<SessionRecord>, ApiError>>;

    /// Submits a lead-capture form.
    fn create_lead<'a>(
        &'a self,
        request: &'a LeadRequest,
    ) -> SiteApiFuture<'a, Result<StatusResponse, ApiError>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Offline backend that fails every call with a transport error.
pub struct NoopSiteApi;

impl NoopSiteApi {
    fn offline<'a, T: 'a>() -> SiteApiFuture<'a, Result<T, ApiError>> {
        Box::pin(async { Err(ApiError::Transport("backend unavailable".to_string())) })
    }
}

impl SiteApi for NoopSiteApi {
    fn create_session<'a>(&'a self) -> SiteApiFuture<'a, Result<SessionId, ApiError>> {
        Self::offline()
    }

    fn track_command<'a>(
        &'a self,
        _request: &'a TrackCommandRequest,
    ) -> SiteApiFuture<'a, Result<(), ApiError>> {
        Self::offline()
    }

    fn upload_files<'a>(
        &'a self,
        _session_id: &'a SessionId,
        _files: &'a [UploadFile],
    ) -> SiteApiFuture<'a, Result<UploadResponse, ApiError>> {
        Self::offline()
    }

    fn list_files<'a>(
        &'a self,
        _credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<Vec<FileSummary>, ApiError>> {
        Self::offline()
    }

    fn file_download_url<'a>(
        &'a self,
        _credential: &'a AdminCredential,
        _id: &'a str,
    ) -> SiteApiFuture<'a, Result<String, ApiError>> {
        Self::offline()
    }

    fn delete_file<'a>(
        &'a self,
        _credential: &'a AdminCredential,
        _id: &'a str,
    ) -> SiteApiFuture<'a, Result<StatusResponse, ApiError>> {
        Self::offline()
    }

    fn dashboard<'a>(
        &'a self,
        _credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<DashboardSummary, ApiError>> {
        Self::offline()
    }

    fn admin_login<'a>(&'a self, _password: &'a str) -> SiteApiFuture<'a, Result<(), ApiError>> {
        Self::offline()
    }

    fn admin_leads<'a>(
        &'a self,
        _credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<Vec<LeadRecord>, ApiError>> {
        Self::offline()
    }

    fn admin_logs<'a>(
        &'a self,
        _credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<Vec<CommandLogRecord>, ApiError>> {
        Self::offline()
    }

    fn admin_sessions<'a>(
        &'a self,
        _credential: &'a AdminCredential,
    ) -> SiteApiFuture<'a, Result<Vec<SessionRecord>, ApiError>> {
        Self::offline()
    }

    fn create_lead<'a>(
        &'a self,
        _request: &'a LeadRequest,
    ) -> SiteApiFuture<'a, Result<StatusResponse, ApiError>> {
        Self::offline()
    }
}

/// Returns the API path segment for an admin topic listing.
pub fn admin_topic_path(topic: AdminTopic) -> String {
    format!("/api/admin/{}", topic.as_str())
}
