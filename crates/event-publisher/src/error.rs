//! Publisher Error Types

use thiserror::Error;

/// Errors raised while talking to the broker
#[derive(Debug, Error)]
pub enum PublishError {
    /// No broker address was configured
    #[error("No broker hosts configured")]
    NoBrokers,

    /// Dialing the brokers failed
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The broker did not accept the message
    #[error("Publish to {topic}[{partition}] failed: {reason}")]
    Send {
        topic: String,
        partition: i32,
        reason: String,
    },

    /// The producer handle can no longer be used
    #[error("Publisher unavailable: {0}")]
    Unavailable(String),
}
