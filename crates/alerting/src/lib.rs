//! Alert Normalization
//!
//! Decodes alert-manager webhook alerts and maps the ones worth notifying
//! about onto the event-bus schema.

pub mod instance;
mod normalizer;
mod types;

pub use instance::{instance_from_host, resolve_instance, HOST_NAME_PATTERN};
pub use normalizer::{
    description, format_timestamp, parse_destinations, status_token, subject_line, wants_ticket,
    Disposition, Normalizer, PipelineConfig, SkipReason, DEFAULT_TOPIC, ORIGIN,
};
pub use types::{
    is_zero_time, zero_time, AlertBatch, Annotations, EventData, Labels, NormalizedEvent,
    RawAlert, STATUS_FIRING, STATUS_RESOLVED,
};
