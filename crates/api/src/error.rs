//! Intake Error Types

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::telemetry::BATCHES_REJECTED;

/// Errors that reject a whole webhook request
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The request body could not be read
    #[error("read body: {0}")]
    ReadBody(String),

    /// The body is not an alert-manager batch
    #[error("decode alert batch: {0}")]
    Decode(#[from] serde_json::Error),
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        error!("{}", self);
        metrics::counter!(BATCHES_REJECTED).increment(1);

        (
            StatusCode::BAD_REQUEST,
            [(header::CONNECTION, "close")],
            self.to_string(),
        )
            .into_response()
    }
}
