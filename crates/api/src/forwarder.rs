//! Per-alert normalize, serialize and publish loop

use std::sync::Arc;

use alerting::{Disposition, NormalizedEvent, Normalizer, RawAlert};
use event_publisher::{EventPublisher, PublishError};
use thiserror::Error;
use tracing::{error, info, trace};

use crate::telemetry::{ALERTS_RECEIVED, ALERTS_SKIPPED, EVENTS_FAILED, EVENTS_PUBLISHED};

/// Failure to deliver a single event
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("marshal event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl ForwardError {
    /// Metric label for the failing step
    pub fn stage(&self) -> &'static str {
        match self {
            ForwardError::Serialize(_) => "serialize",
            ForwardError::Publish(_) => "publish",
        }
    }
}

/// Outcome counts for one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardSummary {
    pub received: usize,
    pub published: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Sends every qualifying alert of a batch to the publisher
pub struct AlertForwarder {
    normalizer: Normalizer,
    publisher: Arc<dyn EventPublisher>,
}

impl AlertForwarder {
    pub fn new(normalizer: Normalizer, publisher: Arc<dyn EventPublisher>) -> Self {
        info!("Forwarding alerts with config: {:?}", normalizer.config());
        Self {
            normalizer,
            publisher,
        }
    }

    /// Handle each alert independently.
    ///
    /// A failing alert is logged and counted; it never stops the batch.
    pub fn forward(&self, alerts: Vec<RawAlert>) -> ForwardSummary {
        let mut summary = ForwardSummary {
            received: alerts.len(),
            ..Default::default()
        };
        metrics::counter!(ALERTS_RECEIVED).increment(alerts.len() as u64);

        for alert in alerts {
            match self.normalizer.classify(alert) {
                Disposition::Skip(reason) => {
                    summary.skipped += 1;
                    metrics::counter!(ALERTS_SKIPPED, "reason" => reason.as_str()).increment(1);
                }
                Disposition::Forward(event) => match self.publish(&event) {
                    Ok(()) => summary.published += 1,
                    Err(e) => {
                        error!(
                            fingerprint = %event.data.fingerprint,
                            stage = e.stage(),
                            "Dropping alert event: {}", e
                        );
                        summary.failed += 1;
                        metrics::counter!(EVENTS_FAILED, "stage" => e.stage()).increment(1);
                    }
                },
            }
        }

        summary
    }

    /// Serialize one event and publish it on the configured topic/partition
    pub fn publish(&self, event: &NormalizedEvent) -> Result<(), ForwardError> {
        let payload = serde_json::to_vec(event)?;
        let config = self.normalizer.config();

        info!(
            fingerprint = %event.data.fingerprint,
            name = %event.name,
            status = %event.data.status,
            "Publishing alert event"
        );
        trace!(">> {}", String::from_utf8_lossy(&payload));

        self.publisher
            .publish(&config.topic, config.partition, &payload)?;
        metrics::counter!(EVENTS_PUBLISHED).increment(1);
        Ok(())
    }
}
