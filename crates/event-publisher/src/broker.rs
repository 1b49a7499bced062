//! Kafka Producer

use std::sync::Mutex;
use std::time::Duration;

use kafka::producer::{Producer, Record, RequiredAcks};
use tracing::{debug, info};

use crate::{EventPublisher, PublishError};

/// Port appended to broker hosts given without one
pub const DEFAULT_BROKER_PORT: u16 = 9092;

/// Kafka connection settings
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Broker `host:port` list
    pub hosts: Vec<String>,
    /// Client id announced to the brokers
    pub client_id: String,
    /// How long the broker may wait for replica acks
    pub ack_timeout: Duration,
}

impl KafkaConfig {
    /// Config for `hosts`, with the process id in the client id
    pub fn new(hosts: Vec<String>) -> Self {
        Self {
            hosts: normalize_broker_hosts(&hosts),
            client_id: format!("alertpusher-kafka[{}]", std::process::id()),
            ack_timeout: Duration::from_secs(1),
        }
    }
}

/// Trim broker entries, drop empty ones and add the default port where missing
pub fn normalize_broker_hosts(hosts: &[String]) -> Vec<String> {
    hosts
        .iter()
        .map(|h| h.trim())
        .filter(|h| !h.is_empty())
        .map(|h| {
            if h.contains(':') {
                h.to_string()
            } else {
                format!("{h}:{DEFAULT_BROKER_PORT}")
            }
        })
        .collect()
}

/// Publisher backed by a single Kafka producer
pub struct KafkaPublisher {
    producer: Mutex<Producer>,
}

impl KafkaPublisher {
    /// Dial the brokers and load topic metadata
    pub fn connect(config: &KafkaConfig) -> Result<Self, PublishError> {
        if config.hosts.is_empty() {
            return Err(PublishError::NoBrokers);
        }

        debug!("Dialing kafka brokers: {:?}", config.hosts);
        let producer = Producer::from_hosts(config.hosts.clone())
            .with_client_id(config.client_id.clone())
            .with_ack_timeout(config.ack_timeout)
            .with_required_acks(RequiredAcks::One)
            .create()
            .map_err(|e| PublishError::Connection(e.to_string()))?;

        info!("Connected to kafka as {}", config.client_id);
        Ok(Self {
            producer: Mutex::new(producer),
        })
    }
}

impl EventPublisher for KafkaPublisher {
    fn publish(&self, topic: &str, partition: i32, payload: &[u8]) -> Result<(), PublishError> {
        let mut producer = self
            .producer
            .lock()
            .map_err(|e| PublishError::Unavailable(e.to_string()))?;

        let record = Record::from_value(topic, payload).with_partition(partition);
        producer.send(&record).map_err(|e| PublishError::Send {
            topic: topic.to_string(),
            partition,
            reason: e.to_string(),
        })
    }
}
