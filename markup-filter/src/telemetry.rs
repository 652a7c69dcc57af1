//! Telemetry for the markup filter
//!
//! Structured events are serialized to JSON and written through `log`, so
//! whatever logger the host installs can collect them.

use log::{info, warn};
use serde::Serialize;

const LOG_PREFIX: &str = "[markup-filter]";

/// Filter event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterEventType {
    /// A disallowed control character was seen
    BinarySuspect,
    /// Filtering stopped, input is copied verbatim
    PassBy,
    /// A buffer ceiling was hit
    CapacityExceeded,
    /// The stream was closed
    Closed,
}

/// Per-instance counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    /// Characters written into the filter
    pub chars_in: usize,
    /// Tags and text runs recognized
    pub sentences: usize,
    pub tags: usize,
    pub text_runs: usize,
    pub comments: usize,
    pub collections_opened: usize,
    pub collections_closed: usize,
    /// `>` outside any unit
    pub stray_brackets: usize,
    /// Tags repaired for a missing `>` or an unterminated quote
    pub recovered_tags: usize,
    pub binary_suspect: bool,
    pub passed_by: bool,
}

/// Structured filter event
#[derive(Debug, Clone, Serialize)]
pub struct FilterEvent {
    pub event_type: FilterEventType,
    /// Character position in the input stream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<FilterStats>,
}

impl FilterEvent {
    pub fn new(event_type: FilterEventType) -> Self {
        Self {
            event_type,
            position: None,
            reason: None,
            stats: None,
        }
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    pub fn with_stats(mut self, stats: FilterStats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Log the event
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(json) => match self.event_type {
                FilterEventType::BinarySuspect
                | FilterEventType::PassBy
                | FilterEventType::CapacityExceeded => {
                    warn!("{} {}", LOG_PREFIX, json);
                }
                FilterEventType::Closed => {
                    info!("{} {}", LOG_PREFIX, json);
                }
            },
            Err(e) => {
                warn!("Failed to serialize filter event: {}", e);
            }
        }
    }
}

/// Event for the first disallowed control character
pub fn event_binary_suspect(position: usize, c: char) -> FilterEvent {
    FilterEvent::new(FilterEventType::BinarySuspect)
        .with_position(position)
        .with_reason(&format!("control character U+{:04X}", c as u32))
}

/// Event for the switch to pass-by mode
pub fn event_pass_by(position: usize, discarded: usize) -> FilterEvent {
    FilterEvent::new(FilterEventType::PassBy)
        .with_position(position)
        .with_reason(&format!("discarded {} buffered characters", discarded))
}

pub fn event_capacity_exceeded(position: usize, capacity: usize) -> FilterEvent {
    FilterEvent::new(FilterEventType::CapacityExceeded)
        .with_position(position)
        .with_reason(&format!("unit exceeds {} characters", capacity))
}

/// Summary event at close
pub fn event_closed(stats: FilterStats) -> FilterEvent {
    FilterEvent::new(FilterEventType::Closed).with_stats(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = event_binary_suspect(12, '\u{1}');
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("binary_suspect"));
        assert!(json.contains("U+0001"));
        assert!(json.contains("\"position\":12"));
        assert!(!json.contains("stats"));
    }

    #[test]
    fn test_closed_carries_stats() {
        let stats = FilterStats {
            chars_in: 5,
            comments: 1,
            ..Default::default()
        };
        let json = serde_json::to_string(&event_closed(stats)).unwrap();
        assert!(json.contains("\"closed\""));
        assert!(json.contains("\"chars_in\":5"));
        assert!(!json.contains("reason"));
    }

    #[test]
    fn test_pass_by_reason() {
        let event = event_pass_by(3, 7);
        assert_eq!(event.reason.as_deref(), Some("discarded 7 buffered characters"));
    }
}
