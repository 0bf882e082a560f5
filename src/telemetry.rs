//! Structured audit events for scrub activity.
//!
//! Events are serialized as JSON lines through the `log` facade so the
//! embedding system's log collector can pick them up without this crate
//! knowing anything about its logging backend.

use log::{info, warn};
use serde::Serialize;

/// Audit event types
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrubEventType {
    /// A marker completed and was removed from the stream
    MarkerRemoved,
    /// A suppress-remainder marker latched; the rest of the stream is
    /// being discarded
    StreamSuppressed,
    /// A session reached end-of-stream and was drained
    SessionFinished,
}

/// One audit event
#[derive(Debug, Clone, Serialize)]
pub struct ScrubEvent {
    /// Event type
    pub event_type: ScrubEventType,
    /// Session the event belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<u64>,
    /// Marker pattern involved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Symbols consumed so far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbols_in: Option<u64>,
    /// Symbols forwarded downstream so far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbols_out: Option<u64>,
    /// Markers removed so far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markers_removed: Option<u64>,
}

impl ScrubEvent {
    /// Create a new event
    pub fn new(event_type: ScrubEventType) -> Self {
        Self {
            event_type,
            session_id: None,
            pattern: None,
            symbols_in: None,
            symbols_out: None,
            markers_removed: None,
        }
    }

    /// Set the session id
    pub fn with_session(mut self, session_id: u64) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Set the marker pattern
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    /// Set the session counters
    pub fn with_counters(mut self, symbols_in: u64, symbols_out: u64, markers_removed: u64) -> Self {
        self.symbols_in = Some(symbols_in);
        self.symbols_out = Some(symbols_out);
        self.markers_removed = Some(markers_removed);
        self
    }

    /// Log the event as a JSON line
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(json) => match self.event_type {
                ScrubEventType::StreamSuppressed => warn!("[SCRUB-AUDIT] {}", json),
                _ => info!("[SCRUB-AUDIT] {}", json),
            },
            Err(e) => {
                warn!("Failed to serialize scrub event: {}", e);
            }
        }
    }
}

/// Event for a removed marker
pub fn marker_removed(session_id: u64, pattern: &str) -> ScrubEvent {
    ScrubEvent::new(ScrubEventType::MarkerRemoved)
        .with_session(session_id)
        .with_pattern(pattern)
}

/// Event for a latched suppress-remainder marker
pub fn stream_suppressed(session_id: u64, pattern: &str) -> ScrubEvent {
    ScrubEvent::new(ScrubEventType::StreamSuppressed)
        .with_session(session_id)
        .with_pattern(pattern)
}

/// Event for a drained session
pub fn session_finished(
    session_id: u64,
    symbols_in: u64,
    symbols_out: u64,
    markers_removed: u64,
) -> ScrubEvent {
    ScrubEvent::new(ScrubEventType::SessionFinished)
        .with_session(session_id)
        .with_counters(symbols_in, symbols_out, markers_removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = marker_removed(7, "<think>");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("marker_removed"));
        assert!(json.contains("<think>"));
        assert!(json.contains("\"session_id\":7"));
        // Unset fields are omitted entirely
        assert!(!json.contains("symbols_in"));
    }

    #[test]
    fn test_session_finished_carries_counters() {
        let event = session_finished(1, 120, 100, 3);
        assert_eq!(event.symbols_in, Some(120));
        assert_eq!(event.symbols_out, Some(100));
        assert_eq!(event.markers_removed, Some(3));
    }

    #[test]
    fn test_suppressed_event_shape() {
        let event = stream_suppressed(2, "</think>");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("stream_suppressed"));
    }
}
