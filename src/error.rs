use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The only failures that cross the storage ports.
///
/// Backend-specific errors are translated into these two kinds at the adapter
/// boundary (see `crate::db`); nothing above a store ever sees a
/// `tokio_postgres::Error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record exists for the given key.
    #[error("Record not found")]
    NotFound,

    /// The store could not be reached or a statement failed.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// A `Result` type that uses `StoreError` as the error type.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A storage error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No valid session accompanies the request.
    #[error("Not authenticated")]
    Unauthenticated,

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Maps a missing record to `Unauthenticated`, for routes where the
    /// missing record is the caller's own session.
    pub fn session_gone(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::Unauthenticated,
            other => AppError::Store(other),
        }
    }
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Store(StoreError::NotFound) => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }

            AppError::Store(StoreError::StorageUnavailable(ref msg)) => {
                tracing::error!("Storage unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Storage unavailable".to_string(),
                )
            }

            AppError::Unauthenticated => {
                tracing::warn!("Request without a valid session");
                (StatusCode::UNAUTHORIZED, "Not authenticated".to_string())
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (
            status,
            [(http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_gone_only_rewrites_not_found() {
        assert!(matches!(
            AppError::session_gone(StoreError::NotFound),
            AppError::Unauthenticated
        ));
        assert!(matches!(
            AppError::session_gone(StoreError::StorageUnavailable("down".into())),
            AppError::Store(StoreError::StorageUnavailable(_))
        ));
    }

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::Store(StoreError::NotFound), StatusCode::NOT_FOUND),
            (
                AppError::Store(StoreError::StorageUnavailable("x".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (AppError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                AppError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
