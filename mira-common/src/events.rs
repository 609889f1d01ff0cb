//! Notification payload types delivered through the gateway
//!
//! Payloads are produced by backend collaborators (generation workers,
//! quality analytics jobs) and forwarded verbatim by the gateway; the
//! gateway never mutates a payload after construction.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Category of a notification, drives client-side alert styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// An async content-generation job finished successfully
    GenerationComplete,

    /// An async content-generation job failed
    GenerationFailed,

    /// Quality analytics flagged a score threshold crossing
    QualityAlert,

    /// Platform-wide operator message
    SystemMessage,
}

/// Delivery priority, scales client-side alert display duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Immutable notification value forwarded to live connections
///
/// Wire schema: `{ kind, title, message, data?, priority, timestamp }`
/// with `timestamp` in milliseconds since the UNIX epoch, stamped at
/// emission time by the producing collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub kind: NotificationKind,

    pub title: String,

    pub message: String,

    /// Optional structured data (job ids, scores, links)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default)]
    pub priority: Priority,

    /// Emission timestamp (epoch milliseconds)
    pub timestamp: u64,
}

impl NotificationPayload {
    /// Get current timestamp in milliseconds since UNIX epoch
    pub fn current_timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    /// Create a payload with an explicit kind and priority
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            data: None,
            priority,
            timestamp: Self::current_timestamp_ms(),
        }
    }

    /// Attach structured data to the payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Create a GenerationComplete payload
    pub fn generation_complete(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            NotificationKind::GenerationComplete,
            title,
            message,
            Priority::Medium,
        )
    }

    /// Create a GenerationFailed payload
    pub fn generation_failed(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            NotificationKind::GenerationFailed,
            title,
            message,
            Priority::High,
        )
    }

    /// Create a QualityAlert payload
    pub fn quality_alert(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            NotificationKind::QualityAlert,
            title,
            message,
            Priority::Medium,
        )
    }

    /// Create a SystemMessage payload
    pub fn system_message(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            NotificationKind::SystemMessage,
            title,
            message,
            Priority::Low,
        )
    }
}
