//! Alert-manager wire schema and the outgoing event schema

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Status string sent for an alert that is still active
pub const STATUS_FIRING: &str = "firing";

/// Status string sent once the underlying condition cleared
pub const STATUS_RESOLVED: &str = "resolved";

/// Unix seconds of `0001-01-01T00:00:00Z`, the instant the alert-manager
/// sends for a time that is not set.
const ZERO_INSTANT_SECS: i64 = -62_135_596_800;

/// The "unset" instant used for missing start/end times
pub fn zero_time() -> DateTime<FixedOffset> {
    DateTime::<Utc>::from_timestamp(ZERO_INSTANT_SECS, 0)
        .unwrap_or_default()
        .fixed_offset()
}

/// Whether a timestamp is the alert-manager's "unset" instant
pub fn is_zero_time(time: &DateTime<FixedOffset>) -> bool {
    time.timestamp() == ZERO_INSTANT_SECS && time.timestamp_subsec_nanos() == 0
}

/// Decode an explicit `null` the same way as an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_zero_time<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_else(zero_time))
}

/// Body of one webhook notification.
///
/// A missing or `null` alert list is an empty batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertBatch {
    #[serde(default, deserialize_with = "null_as_default")]
    pub alerts: Vec<RawAlert>,
}

impl AlertBatch {
    /// Decode a webhook body; a top-level `null` is an empty batch
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(serde_json::from_slice::<Option<Self>>(body)?.unwrap_or_default())
    }
}

/// One alert as pushed by the alert-manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAlert {
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Labels,
    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: Annotations,
    #[serde(
        rename = "startsAt",
        default = "zero_time",
        deserialize_with = "null_as_zero_time"
    )]
    pub starts_at: DateTime<FixedOffset>,
    /// Zero instant while the alert is firing
    #[serde(
        rename = "endsAt",
        default = "zero_time",
        deserialize_with = "null_as_zero_time"
    )]
    pub ends_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub fingerprint: String,
}

impl RawAlert {
    pub fn is_resolved(&self) -> bool {
        self.status == STATUS_RESOLVED
    }

    /// End time, if the source system set one
    pub fn ended_at(&self) -> Option<DateTime<FixedOffset>> {
        (!is_zero_time(&self.ends_at)).then_some(self.ends_at)
    }
}

impl Default for RawAlert {
    fn default() -> Self {
        Self {
            status: STATUS_FIRING.to_string(),
            labels: Labels::default(),
            annotations: Annotations::default(),
            starts_at: zero_time(),
            ends_at: zero_time(),
            fingerprint: String::new(),
        }
    }
}

/// Alert metadata labels understood by this adapter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    #[serde(rename = "alertname")]
    pub alert_name: String,
    pub host_index: String,
    pub host_name: String,
    pub instance: String,
    pub uplink: String,
    pub category: String,
    pub vendor: String,
    pub model: String,
    pub severity: String,
    pub component: String,
    pub service: String,
    /// Comma separated notification recipients
    pub email: String,
    /// `"true"` requests a ticket downstream
    pub jira: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotations {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub value: String,
}

/// Event record published on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub name: String,
    pub origin: String,
    pub topic: String,
    pub data: EventData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub fingerprint: String,
    pub status: String,
    pub severity: String,
    pub subject: String,
    pub description: String,
    pub destination: Vec<String>,
    pub create_ticket: bool,
    pub started_at: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<FixedOffset>>,
    /// The alert exactly as received
    pub raw: RawAlert,
}
