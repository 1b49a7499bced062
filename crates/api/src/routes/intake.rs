//! Alert-manager webhook route

use std::sync::Arc;

use alerting::AlertBatch;
use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use tracing::{debug, error, trace};

use crate::{error::IntakeError, AppState};

/// Largest webhook body accepted
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Decode a batch and forward each alert.
///
/// Answers 202 once the batch decodes, whatever happens to the individual
/// alerts afterwards.
pub async fn receive_alerts(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<impl IntoResponse, IntakeError> {
    let body = to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| IntakeError::ReadBody(e.to_string()))?;
    trace!("<< {}", String::from_utf8_lossy(&body));

    let batch = AlertBatch::from_slice(&body)?;
    debug!("Received batch of {} alerts", batch.alerts.len());

    let forwarder = Arc::clone(&state.forwarder);
    match tokio::task::spawn_blocking(move || forwarder.forward(batch.alerts)).await {
        Ok(summary) => debug!(
            received = summary.received,
            published = summary.published,
            skipped = summary.skipped,
            failed = summary.failed,
            "Batch forwarded"
        ),
        Err(e) => error!("Alert forwarding task failed: {}", e),
    }

    Ok(([(header::CONNECTION, "close")], StatusCode::ACCEPTED))
}
