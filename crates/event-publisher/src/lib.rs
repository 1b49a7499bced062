//! Event Publishing
//!
//! Hands serialized events to a message broker:
//! - `EventPublisher` seam used by the intake pipeline
//! - Kafka producer with broker-list normalization
//! - In-memory publisher for tests and dry runs

mod broker;
mod error;
mod memory;

pub use broker::{normalize_broker_hosts, KafkaConfig, KafkaPublisher, DEFAULT_BROKER_PORT};
pub use error::PublishError;
pub use memory::{MemoryPublisher, PublishedMessage};

/// Destination for serialized events.
///
/// Implementations must accept concurrent calls from several in-flight
/// requests; the pipeline adds no synchronization of its own.
pub trait EventPublisher: Send + Sync {
    /// Publish one payload to `topic`/`partition`
    fn publish(&self, topic: &str, partition: i32, payload: &[u8]) -> Result<(), PublishError>;
}
