//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::db::StoreError;
use crate::metadata::MetadataError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Catalog operation failure, status chosen by error kind
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<songlib_common::Error> for ApiError {
    fn from(err: songlib_common::Error) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Catalog(CatalogError::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            ApiError::Catalog(CatalogError::Store(err)) => match err {
                StoreError::NoMatch => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                StoreError::Conflict { .. } => (StatusCode::CONFLICT, "CONFLICT"),
                StoreError::MalformedFilter(_) => (StatusCode::BAD_REQUEST, "BAD_FILTER"),
                StoreError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "DATABASE_TIMEOUT"),
                StoreError::Backend { .. } | StoreError::RollbackFailed { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
                }
            },
            ApiError::Catalog(CatalogError::Metadata(err)) => match err {
                MetadataError::RemoteBadRequest(_) => {
                    (StatusCode::BAD_REQUEST, "METADATA_BAD_REQUEST")
                }
                MetadataError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "METADATA_TIMEOUT"),
                MetadataError::Transport(_)
                | MetadataError::RemoteInternal(_)
                | MetadataError::UnexpectedStatus(_)
                | MetadataError::MalformedResponse(_) => {
                    (StatusCode::BAD_GATEWAY, "METADATA_UNAVAILABLE")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "Request failed");
        } else {
            tracing::debug!(code = error_code, error = %self, "Request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn status(err: impl Into<CatalogError>) -> StatusCode {
        ApiError::Catalog(err.into()).status_and_code().0
    }

    #[test]
    fn test_store_errors_map_to_status() {
        assert_eq!(status(StoreError::NoMatch), StatusCode::NOT_FOUND);
        assert_eq!(
            status(StoreError::MalformedFilter("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(StoreError::Conflict {
                group: "g".into(),
                name: "n".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(StoreError::Timeout {
                operation: "get song",
                after: Duration::from_secs(15)
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_metadata_errors_map_to_status() {
        assert_eq!(
            status(MetadataError::RemoteBadRequest(String::new())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(MetadataError::RemoteInternal(String::new())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(MetadataError::UnexpectedStatus(418)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(MetadataError::Timeout(Duration::from_secs(30))),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
