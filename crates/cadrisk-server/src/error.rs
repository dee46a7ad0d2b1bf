//! HTTP error mapping.
//!
//! Every error body is a flat `{"error": "<message>"}` object.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use cadrisk_contracts::error::CadError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Request-level errors with their status codes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Anything wrong with the submitted form or the pipeline run on it.
    #[error("Error processing form data: {0}")]
    BadRequest(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    /// The blocking assessment task could not be joined.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CadError> for ApiError {
    fn from(err: CadError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// Errors that stop the server from starting or running.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Startup(#[from] CadError),
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}
