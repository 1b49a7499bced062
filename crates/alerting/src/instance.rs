//! Instance name derivation from host names
//!
//! Hosts follow the `<prefix>.<instance>.<site>.example.net` naming convention,
//! so the short instance can be recovered from the host name when the alert
//! does not carry an `instance` label.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::Labels;

/// Host naming convention; the first capture group is the instance
pub const HOST_NAME_PATTERN: &str = r".+\.([^.]+)\.[^.]+\.example\.net";

static HOST_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(HOST_NAME_PATTERN).expect("host name pattern is valid"));

/// Extract the instance segment from a host name
pub fn instance_from_host(host_name: &str) -> Option<&str> {
    HOST_NAME_RE
        .captures(host_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Instance label, falling back to the host-derived instance.
///
/// Returns an empty string when neither is available.
pub fn resolve_instance(labels: &Labels) -> String {
    if !labels.instance.is_empty() {
        return labels.instance.clone();
    }
    instance_from_host(&labels.host_name)
        .map(str::to_string)
        .unwrap_or_default()
}
