//! Transient UI alerts derived from notification payloads
//!
//! Generation outcomes map to success/error alerts; quality and system
//! messages are informational. Display duration scales with the payload's
//! priority; high priority is shown longest.

use mira_common::events::{NotificationKind, NotificationPayload, Priority};
use std::time::Duration;

/// Visual style of a transient alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    Success,
    Error,
    Info,
}

/// A transient alert ready for the UI to render
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub display: Duration,
}

impl Alert {
    /// Map a received payload onto its alert presentation
    pub fn for_payload(payload: &NotificationPayload) -> Self {
        let severity = match payload.kind {
            NotificationKind::GenerationComplete => AlertSeverity::Success,
            NotificationKind::GenerationFailed => AlertSeverity::Error,
            NotificationKind::QualityAlert | NotificationKind::SystemMessage => AlertSeverity::Info,
        };

        let display = match payload.priority {
            Priority::Low => Duration::from_secs(3),
            Priority::Medium => Duration::from_secs(5),
            Priority::High => Duration::from_secs(10),
        };

        Self {
            severity,
            title: payload.title.clone(),
            message: payload.message.clone(),
            display,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mira_common::events::NotificationPayload;

    #[test]
    fn test_kind_to_severity_mapping() {
        let complete = NotificationPayload::generation_complete("t", "m");
        assert_eq!(Alert::for_payload(&complete).severity, AlertSeverity::Success);

        let failed = NotificationPayload::generation_failed("t", "m");
        assert_eq!(Alert::for_payload(&failed).severity, AlertSeverity::Error);

        let quality = NotificationPayload::quality_alert("t", "m");
        assert_eq!(Alert::for_payload(&quality).severity, AlertSeverity::Info);

        let system = NotificationPayload::system_message("t", "m");
        assert_eq!(Alert::for_payload(&system).severity, AlertSeverity::Info);
    }

    #[test]
    fn test_display_duration_scales_with_priority() {
        let mut payload = NotificationPayload::system_message("t", "m");

        payload.priority = Priority::Low;
        let low = Alert::for_payload(&payload).display;
        payload.priority = Priority::Medium;
        let medium = Alert::for_payload(&payload).display;
        payload.priority = Priority::High;
        let high = Alert::for_payload(&payload).display;

        assert!(low < medium && medium < high);
    }
}
