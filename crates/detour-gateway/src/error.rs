use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use detour_core::StorageError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: u16,
    name: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

impl AppError {
    fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) | AppError::Storage(StorageError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NotFoundError")
            }
            AppError::BadRequest(_) | AppError::Storage(StorageError::InvalidData(_)) => {
                (StatusCode::BAD_REQUEST, "ValidationError")
            }
            AppError::Storage(StorageError::Conflict(_)) => (StatusCode::CONFLICT, "ConflictError"),
            AppError::Storage(StorageError::Unavailable(_) | StorageError::Timeout(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "UnavailableError")
            }
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, name) = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                status: status.as_u16(),
                name,
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_map_to_http_status() {
        let cases = [
            (StorageError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (StorageError::Conflict("x".into()), StatusCode::CONFLICT),
            (StorageError::InvalidData("x".into()), StatusCode::BAD_REQUEST),
            (StorageError::Timeout("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (StorageError::Query("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).into_response().status(), expected);
        }
    }
}
