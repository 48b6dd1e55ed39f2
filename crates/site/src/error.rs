//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use site_contract::ErrorResponse;
use thiserror::Error;

use crate::{blob::BlobError, store::StoreError};

/// Failure returned by a route, rendered as `{error, detail?}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request input.
    #[error("{0}")]
    BadRequest(String),
    /// Missing resource.
    #[error("{0}")]
    NotFound(String),
    /// Missing or wrong admin credential.
    #[error("admin authorization required")]
    Unauthorized,
    /// Invalid or expired signed URL.
    #[error("invalid or expired link")]
    Forbidden,
    /// Too many failed admin attempts.
    #[error("too many failed attempts; try again later")]
    LockedOut,
    /// No admin password configured.
    #[error("admin access is not configured")]
    AdminUnavailable,
    /// Storage or upstream failure.
    #[error("{message}")]
    Internal {
        /// Generic message shown to clients.
        message: String,
        /// Underlying cause.
        detail: Option<String>,
    },
}

impl ApiError {
    /// Wraps a failure with a generic message and its cause as detail.
    pub fn internal(message: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Internal {
            message: message.into(),
            detail: Some(cause.to_string()),
        }
    }

    /// Status code for the variant.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::LockedOut => StatusCode::TOO_MANY_REQUESTS,
            Self::AdminUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::internal("storage failure", err)
    }
}

impl From<BlobError> for ApiError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::NotFound => Self::NotFound("File not found".to_string()),
            other => Self::internal("blob storage failure", other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            Self::Internal { detail, .. } => {
                tracing::error!(error = %self, detail = ?detail, "request failed");
                detail.clone()
            }
            _ => None,
        };
        let body = ErrorResponse {
            error: self.to_string(),
            detail,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_blob_maps_to_not_found() {
        let err = ApiError::from(BlobError::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "File not found");
    }

    #[test]
    fn store_errors_keep_their_cause_as_detail() {
        let err = ApiError::from(StoreError::Poisoned);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(
            err,
            ApiError::Internal { detail: Some(ref detail), .. } if detail == "store lock poisoned"
        ));
    }
}
