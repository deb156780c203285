//! Error types for the legal-lens server

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use legal_lens_core::ClauseParseError;
use thiserror::Error;

use crate::models::ErrorBody;

pub const UNREADABLE_DETAIL: &str = "The document is unreadable: no text could be extracted. \
     It may be scanned, encrypted, or corrupt.";
pub const MALFORMED_DETAIL: &str =
    "Failed to structure the AI output: the clause extraction response was not in the expected format.";
pub const INTERNAL_DETAIL: &str = "An internal error occurred while analyzing the document.";

/// Request-level failures, each mapped to a status code and a `detail` message.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No file uploaded")]
    NoFile,

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Uploaded file is not a PDF")]
    NotPdf,

    #[error("Uploaded file exceeds the size limit")]
    PayloadTooLarge,

    #[error("document unreadable")]
    Unreadable,

    #[error("malformed AI output: {0}")]
    MalformedAiOutput(#[from] ClauseParseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoFile | ApiError::InvalidUpload(_) | ApiError::NotPdf | ApiError::Unreadable => {
                StatusCode::BAD_REQUEST
            }
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::MalformedAiOutput(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the caller. Never includes internal error text.
    pub fn detail(&self) -> String {
        match self {
            ApiError::Unreadable => UNREADABLE_DETAIL.to_string(),
            ApiError::MalformedAiOutput(_) => MALFORMED_DETAIL.to_string(),
            ApiError::Internal(_) => INTERNAL_DETAIL.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        (status, Json(ErrorBody::new(self.detail()))).into_response()
    }
}
