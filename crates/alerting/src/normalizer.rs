//! Alert Normalizer Implementation
//!
//! Turns one alert-manager alert into at most one bus event. Alerts that
//! nobody should be notified about are dropped here, never rejected.

use std::fmt;

use chrono::{DateTime, FixedOffset, Local, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::instance::resolve_instance;
use crate::types::{EventData, NormalizedEvent, RawAlert};

/// Value of the `origin` field on every event
pub const ORIGIN: &str = "Horus";

/// Topic used when none is configured
pub const DEFAULT_TOPIC: &str = "alert.noc";

/// Layout of timestamps in the description block
const DESCRIPTION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:::z";

/// Routing and filtering settings, fixed at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Output topic, also copied into each event
    pub topic: String,
    /// Output partition
    pub partition: i32,
    /// Drop alerts whose status is `resolved`
    pub skip_resolved: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            partition: 0,
            skip_resolved: false,
        }
    }
}

/// Why an alert produced no event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Resolved alert while resolved alerts are skipped
    Resolved,
    /// No notification recipients
    NoRecipients,
    /// Severity label is `ok`
    SeverityOk,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Resolved => "resolved",
            SkipReason::NoRecipients => "no_recipients",
            SkipReason::SeverityOk => "severity_ok",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of normalizing one alert
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    Forward(Box<NormalizedEvent>),
    Skip(SkipReason),
}

/// Stateless alert normalizer
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: PipelineConfig,
}

impl Normalizer {
    /// Create a new normalizer
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// First filter rule matching the alert, if any
    pub fn skip_reason(&self, alert: &RawAlert) -> Option<SkipReason> {
        if alert.is_resolved() && self.config.skip_resolved {
            return Some(SkipReason::Resolved);
        }
        if alert.labels.email.is_empty() {
            return Some(SkipReason::NoRecipients);
        }
        if alert.labels.severity == "ok" {
            return Some(SkipReason::SeverityOk);
        }
        None
    }

    /// Apply the filter rules and build the event for surviving alerts
    pub fn classify(&self, alert: RawAlert) -> Disposition {
        match self.skip_reason(&alert) {
            Some(reason) => {
                debug!(
                    fingerprint = %alert.fingerprint,
                    reason = %reason,
                    "Skipping alert"
                );
                Disposition::Skip(reason)
            }
            None => Disposition::Forward(Box::new(self.build_event(alert, &Local))),
        }
    }

    /// Normalize an alert, dropping it if a filter rule matches
    pub fn normalize(&self, alert: RawAlert) -> Option<NormalizedEvent> {
        match self.classify(alert) {
            Disposition::Forward(event) => Some(*event),
            Disposition::Skip(_) => None,
        }
    }

    /// Map an alert onto the event schema without filtering.
    ///
    /// Description timestamps are rendered in `tz`.
    pub fn build_event<Tz>(&self, alert: RawAlert, tz: &Tz) -> NormalizedEvent
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let instance = resolve_instance(&alert.labels);

        NormalizedEvent {
            name: alert.labels.alert_name.clone(),
            origin: ORIGIN.to_string(),
            topic: self.config.topic.clone(),
            data: EventData {
                fingerprint: alert.fingerprint.clone(),
                status: alert.status.clone(),
                severity: alert.labels.severity.clone(),
                subject: subject_line(&alert, &instance),
                description: description(&alert, tz),
                destination: parse_destinations(&alert.labels.email),
                create_ticket: wants_ticket(&alert.labels.jira),
                started_at: alert.starts_at,
                ended_at: alert.ended_at(),
                raw: alert,
            },
        }
    }
}

/// Severity token shown in the subject; resolved alerts always show `OK`
pub fn status_token(alert: &RawAlert) -> String {
    if alert.is_resolved() {
        "OK".to_string()
    } else {
        alert.labels.severity.to_uppercase()
    }
}

/// `[ALRT][<token>] <instance>: <value>`
pub fn subject_line(alert: &RawAlert, instance: &str) -> String {
    format!(
        "[ALRT][{}] {}: {}",
        status_token(alert),
        instance,
        alert.annotations.value
    )
}

/// Multi-line `key=value` description.
///
/// `status`, `output`, `host` and `start_time` are always present; the
/// remaining lines only when their source is set.
pub fn description<Tz>(alert: &RawAlert, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut lines = vec![
        format!("status={}", alert.status),
        format!("output={}", alert.annotations.value),
        format!("host={}", alert.labels.host_name),
        format!("start_time={}", format_timestamp(&alert.starts_at, tz)),
    ];
    if let Some(ended) = alert.ended_at() {
        lines.push(format!("end_time={}", format_timestamp(&ended, tz)));
    }
    if !alert.labels.uplink.is_empty() {
        lines.push(format!("uplink={}", alert.labels.uplink));
    }
    if !alert.labels.component.is_empty() {
        lines.push(format!("component={}", alert.labels.component));
    }
    lines.join("\n")
}

/// `YYYY-MM-DD HH:MM:SS±HH` in the given zone
pub fn format_timestamp<Tz>(time: &DateTime<FixedOffset>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    time.with_timezone(tz)
        .format(DESCRIPTION_TIME_FORMAT)
        .to_string()
}

/// Split the recipient label on commas after stripping all whitespace.
///
/// Empty segments are kept.
pub fn parse_destinations(email: &str) -> Vec<String> {
    let compact: String = email.chars().filter(|c| !c.is_whitespace()).collect();
    compact.split(',').map(str::to_string).collect()
}

/// Only the exact string `true` requests a ticket
pub fn wants_ticket(label: &str) -> bool {
    label == "true"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Annotations, Labels, STATUS_RESOLVED};
    use chrono::Utc;

    fn disk_full_alert() -> RawAlert {
        RawAlert {
            status: "firing".into(),
            labels: Labels {
                alert_name: "DiskFull".into(),
                host_name: "srv01.db1.par.example.net".into(),
                instance: "db1".into(),
                severity: "critical".into(),
                email: "a@x.com, b@y.com".into(),
                jira: "true".into(),
                ..Default::default()
            },
            annotations: Annotations {
                value: "disk full".into(),
                ..Default::default()
            },
            starts_at: DateTime::parse_from_rfc3339("2024-03-01T10:15:30Z").unwrap(),
            fingerprint: "c0ffee".into(),
            ..Default::default()
        }
    }

    fn resolved(mut alert: RawAlert) -> RawAlert {
        alert.status = STATUS_RESOLVED.into();
        alert.ends_at = DateTime::parse_from_rfc3339("2024-03-01T11:00:00Z").unwrap();
        alert
    }

    #[test]
    fn test_subject_line() {
        let alert = disk_full_alert();
        assert_eq!(subject_line(&alert, "db1"), "[ALRT][CRITICAL] db1: disk full");

        let alert = resolved(alert);
        assert_eq!(subject_line(&alert, "db1"), "[ALRT][OK] db1: disk full");
    }

    #[test]
    fn test_skip_empty_email_and_ok_severity() {
        let normalizer = Normalizer::default();

        let mut alert = disk_full_alert();
        alert.labels.email.clear();
        assert_eq!(normalizer.skip_reason(&alert), Some(SkipReason::NoRecipients));
        assert!(normalizer.normalize(alert).is_none());

        let mut alert = disk_full_alert();
        alert.labels.severity = "ok".into();
        assert_eq!(normalizer.skip_reason(&alert), Some(SkipReason::SeverityOk));
        assert!(normalizer.normalize(alert).is_none());

        // Severity match is case-sensitive
        let mut alert = disk_full_alert();
        alert.labels.severity = "OK".into();
        assert!(normalizer.normalize(alert).is_some());
    }

    #[test]
    fn test_skip_resolved_only_when_configured() {
        let forwarding = Normalizer::default();
        let event = forwarding.normalize(resolved(disk_full_alert())).unwrap();
        assert_eq!(event.data.subject, "[ALRT][OK] db1: disk full");

        let skipping = Normalizer::new(PipelineConfig {
            skip_resolved: true,
            ..Default::default()
        });
        assert_eq!(
            skipping.classify(resolved(disk_full_alert())),
            Disposition::Skip(SkipReason::Resolved)
        );
        assert!(skipping.normalize(disk_full_alert()).is_some());
    }

    #[test]
    fn test_resolved_rule_checked_first() {
        let normalizer = Normalizer::new(PipelineConfig {
            skip_resolved: true,
            ..Default::default()
        });
        let mut alert = resolved(disk_full_alert());
        alert.labels.email.clear();
        assert_eq!(normalizer.skip_reason(&alert), Some(SkipReason::Resolved));
    }

    #[test]
    fn test_event_mapping() {
        let normalizer = Normalizer::new(PipelineConfig {
            topic: "alert.test".into(),
            ..Default::default()
        });
        let alert = disk_full_alert();
        let event = normalizer.build_event(alert.clone(), &Utc);

        assert_eq!(event.name, "DiskFull");
        assert_eq!(event.origin, ORIGIN);
        assert_eq!(event.topic, "alert.test");
        assert_eq!(event.data.fingerprint, "c0ffee");
        assert_eq!(event.data.status, "firing");
        assert_eq!(event.data.severity, "critical");
        assert_eq!(event.data.destination, vec!["a@x.com", "b@y.com"]);
        assert!(event.data.create_ticket);
        assert_eq!(event.data.started_at, alert.starts_at);
        assert_eq!(event.data.ended_at, None);
        assert_eq!(event.data.raw, alert);
    }

    #[test]
    fn test_instance_derived_from_host() {
        let normalizer = Normalizer::default();
        let mut alert = disk_full_alert();
        alert.labels.instance.clear();
        alert.labels.host_name = "fw2.edge9.lon.example.net".into();

        let event = normalizer.build_event(alert, &Utc);
        assert_eq!(event.data.subject, "[ALRT][CRITICAL] edge9: disk full");
        // Raw alert keeps the labels as received
        assert_eq!(event.data.raw.labels.instance, "");
    }

    #[test]
    fn test_instance_left_empty_without_match() {
        let normalizer = Normalizer::default();
        let mut alert = disk_full_alert();
        alert.labels.instance.clear();
        alert.labels.host_name = "standalone".into();

        let event = normalizer.build_event(alert, &Utc);
        assert_eq!(event.data.subject, "[ALRT][CRITICAL] : disk full");
    }

    #[test]
    fn test_description_minimal() {
        let alert = disk_full_alert();
        assert_eq!(
            description(&alert, &Utc),
            "status=firing\n\
             output=disk full\n\
             host=srv01.db1.par.example.net\n\
             start_time=2024-03-01 10:15:30+00"
        );
    }

    #[test]
    fn test_description_full_order() {
        let mut alert = resolved(disk_full_alert());
        alert.labels.uplink = "transit-1".into();
        alert.labels.component = "disk".into();
        alert.labels.host_name.clear();

        let paris = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(
            description(&alert, &paris),
            "status=resolved\n\
             output=disk full\n\
             host=\n\
             start_time=2024-03-01 11:15:30+01\n\
             end_time=2024-03-01 12:00:00+01\n\
             uplink=transit-1\n\
             component=disk"
        );
    }

    #[test]
    fn test_end_time_only_when_set() {
        let normalizer = Normalizer::default();
        let event = normalizer.build_event(resolved(disk_full_alert()), &Utc);
        assert_eq!(
            event.data.ended_at.map(|t| t.to_rfc3339()),
            Some("2024-03-01T11:00:00+00:00".to_string())
        );
        assert!(event.data.description.contains("\nend_time=2024-03-01 11:00:00+00"));
    }

    #[test]
    fn test_destinations() {
        assert_eq!(parse_destinations("a@x.com, b@y.com"), vec!["a@x.com", "b@y.com"]);
        assert_eq!(parse_destinations(" a@x.com\t"), vec!["a@x.com"]);
        assert_eq!(parse_destinations("a@x.com,,b@y.com,"), vec!["a@x.com", "", "b@y.com", ""]);
    }

    #[test]
    fn test_ticket_flag() {
        assert!(wants_ticket("true"));
        for value in ["True", "TRUE", "1", "yes", "", " true"] {
            assert!(!wants_ticket(value), "{value:?} must not request a ticket");
        }
    }

    #[test]
    fn test_serialized_event_shape() {
        let normalizer = Normalizer::default();
        let event = normalizer.build_event(disk_full_alert(), &Utc);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["origin"], "Horus");
        assert_eq!(json["topic"], DEFAULT_TOPIC);
        assert_eq!(json["data"]["create_ticket"], true);
        assert_eq!(json["data"]["started_at"], "2024-03-01T10:15:30Z");
        assert_eq!(json["data"]["raw"]["labels"]["alertname"], "DiskFull");
        assert_eq!(json["data"]["raw"]["startsAt"], "2024-03-01T10:15:30Z");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_alert() -> impl Strategy<Value = RawAlert> {
            (
                prop_oneof![Just("firing"), Just("resolved")],
                prop_oneof![Just("critical"), Just("warning"), Just("ok"), Just("OK")],
                prop_oneof![Just(""), Just("noc@example.net"), Just("a@x.com, b@y.com")],
                "[a-z0-9]{0,8}",
                "[a-z0-9.]{0,24}",
            )
                .prop_map(|(status, severity, email, instance, host)| RawAlert {
                    status: status.into(),
                    labels: Labels {
                        severity: severity.into(),
                        email: email.into(),
                        instance,
                        host_name: host,
                        ..Default::default()
                    },
                    ..Default::default()
                })
        }

        proptest! {
            #[test]
            fn filtered_alerts_are_dropped(alert in arb_alert(), skip in any::<bool>()) {
                let normalizer = Normalizer::new(PipelineConfig {
                    skip_resolved: skip,
                    ..Default::default()
                });
                let drop_expected = alert.labels.email.is_empty()
                    || alert.labels.severity == "ok"
                    || (skip && alert.status == "resolved");
                prop_assert_eq!(normalizer.normalize(alert).is_none(), drop_expected);
            }

            #[test]
            fn explicit_instance_is_kept(alert in arb_alert()) {
                prop_assume!(!alert.labels.instance.is_empty());
                let expected = format!(
                    "[ALRT][{}] {}: ",
                    status_token(&alert),
                    alert.labels.instance
                );
                let event = Normalizer::default().build_event(alert, &Utc);
                prop_assert_eq!(event.data.subject, expected);
            }
        }
    }
}
