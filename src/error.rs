use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Stored data is inconsistent or undecodable; retrying will not help
    #[error("Store error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// True when the failure is an infrastructure problem rather than a caller defect.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, MediaError::StoreUnavailable(_) | MediaError::Storage(_))
    }
}

impl From<StoreError> for MediaError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(_) => MediaError::StoreUnavailable(e.to_string()),
            StoreError::Missing(_) | StoreError::Corrupt(_) => MediaError::Storage(e.to_string()),
        }
    }
}

impl IntoResponse for MediaError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            MediaError::InvalidReference(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            MediaError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            MediaError::StoreUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Media store unavailable".to_string(),
            ),
            MediaError::AuthRequired => (StatusCode::UNAUTHORIZED, self.to_string()),
            MediaError::PermissionDenied => (StatusCode::FORBIDDEN, self.to_string()),
            MediaError::Storage(_)
            | MediaError::Config(_)
            | MediaError::Manifest(_)
            | MediaError::Io(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, MediaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_status() {
        let unavailable: MediaError = StoreError::Unavailable("connection refused".into()).into();
        assert!(matches!(unavailable, MediaError::StoreUnavailable(_)));
        assert_eq!(unavailable.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        for err in [
            StoreError::Corrupt("asset img1: unknown variant".into()),
            StoreError::Missing("placeholder row 7 (dup)".into()),
        ] {
            let err: MediaError = err.into();
            assert!(matches!(err, MediaError::Storage(_)));
            assert!(err.is_store_failure());
            assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
