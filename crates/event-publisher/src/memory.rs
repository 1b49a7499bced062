//! In-memory publisher

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::debug;

use crate::{EventPublisher, PublishError};

/// A message accepted by `MemoryPublisher`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub partition: i32,
    pub payload: Vec<u8>,
}

/// Publisher that keeps messages in memory
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    messages: Mutex<Vec<PublishedMessage>>,
    /// Number of upcoming publishes to reject
    failures: AtomicUsize,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` publishes
    pub fn failing_first(self, count: usize) -> Self {
        self.failures.store(count, Ordering::SeqCst);
        self
    }

    /// Messages accepted so far
    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventPublisher for MemoryPublisher {
    fn publish(&self, topic: &str, partition: i32, payload: &[u8]) -> Result<(), PublishError> {
        let rejected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(PublishError::Send {
                topic: topic.to_string(),
                partition,
                reason: "rejected by memory publisher".to_string(),
            });
        }

        let mut messages = self
            .messages
            .lock()
            .map_err(|e| PublishError::Unavailable(e.to_string()))?;
        messages.push(PublishedMessage {
            topic: topic.to_string(),
            partition,
            payload: payload.to_vec(),
        });
        debug!("Stored message {} for {}[{}]", messages.len(), topic, partition);
        Ok(())
    }
}
