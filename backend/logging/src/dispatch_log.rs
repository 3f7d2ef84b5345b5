//! Dispatch event log
//!
//! One structured record per routed message outcome, serialized to the
//! `dispatch_events` tracing target so it lands in the NDJSON file.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum DispatchEvent {
    CommandInvoked {
        command: String,
        content: String,
    },
    CustomCommand {
        name: String,
    },
    CommandFailed {
        command: Option<String>,
        kind: String,
        error_msg: String,
    },
    PanicRecovered {
        command: String,
        panic_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub invocation_id: String,
    pub channel_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: DispatchEvent,
}

impl EventLogEntry {
    /// Build an entry, scrubbing user-supplied text on the way in.
    pub fn new(invocation_id: &str, channel_id: &str, mut event: DispatchEvent) -> Self {
        match &mut event {
            DispatchEvent::CommandInvoked { content, .. } => {
                *content = redact_sensitive_data(content);
            }
            DispatchEvent::CommandFailed { error_msg, .. } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
            DispatchEvent::PanicRecovered { panic_msg, .. } => {
                *panic_msg = redact_sensitive_data(panic_msg);
            }
            DispatchEvent::CustomCommand { .. } => {}
        }

        Self {
            invocation_id: invocation_id.into(),
            channel_id: channel_id.into(),
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

pub struct DispatchLogger;

impl DispatchLogger {
    pub fn log_event(invocation_id: &str, channel_id: &str, event: DispatchEvent) {
        let entry = EventLogEntry::new(invocation_id, channel_id, event);
        info!(target: "dispatch_events", entry = %entry.to_json(), "Dispatch event");
    }
}
