//! Error-to-HTTP response conversion.
//!
//! Route handlers return `Result<T, AppError>` so that query errors from the
//! database crate map straight onto status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use plcimages_common::Error;
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for the common error type.
#[derive(Debug)]
pub struct AppError(pub Error);

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Server error in API handler");
        }

        let code = match &self.0 {
            Error::NotFound(_) => "not_found",
            Error::InvalidInput(_) => "invalid_input",
            Error::Database(_) => "database_error",
        };

        let body = json!({
            "error": self.0.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
