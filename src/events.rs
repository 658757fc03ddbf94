//! Transcript and damage events for the capture pipeline.
//!
//! This module defines the two notification types that flow through the
//! pipeline:
//!
//! - [`DamageEvent`] - internal, from the terminal model to its listeners:
//!   "state changed, re-read the view".
//! - [`TranscriptEvent`] - external, from the capture engine to consumers:
//!   one committed line of child output.
//!
//! # Wire format
//!
//! [`TranscriptEvent::to_wire`] produces the JSON shape consumed by
//! automation wrappers:
//!
//! ```json
//! { "type": "append",
//!   "text": "<line>\n",
//!   "meta": { "timestampUtc": "<RFC3339>", "source": "SCROLLBACK" } }
//! ```
//!
//! Consumers should treat unknown `type` values as opaque and preserve them
//! for forward compatibility - `WireEvent` keeps the field as a plain string
//! for that reason.

// Rust guideline compliant 2026-03

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Kind of a transcript event.
///
/// Only `Append` exists today; the enum is reserved so future kinds
/// (truncation markers, resets) can be added without a wire break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A line was appended to the transcript.
    Append,
}

/// Which capture signal produced a transcript event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    /// The line scrolled off the top of the screen into history. Primary
    /// signal: history lines are immutable once committed.
    History,
    /// The line sat unchanged in the stable screen region for the full
    /// stability window. Secondary signal for output that never scrolls.
    ScreenStable,
}

impl EventSource {
    /// Wire-level name for this source.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::History => "SCROLLBACK",
            Self::ScreenStable => "SCREEN_STABLE",
        }
    }
}

/// One committed line of child output.
///
/// `text` is a normalized line (trailing space/tab/NUL stripped) terminated
/// by exactly one `\n` and containing no other control characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEvent {
    /// Event kind - always [`EventKind::Append`] today.
    pub kind: EventKind,
    /// Normalized line text, `\n`-terminated.
    pub text: String,
    /// UTC instant at emission.
    pub timestamp: DateTime<Utc>,
    /// Which signal produced the line.
    pub source: EventSource,
}

impl TranscriptEvent {
    /// Create an append event stamped with the current UTC time.
    #[must_use]
    pub fn append(text: impl Into<String>, source: EventSource) -> Self {
        Self {
            kind: EventKind::Append,
            text: text.into(),
            timestamp: Utc::now(),
            source,
        }
    }

    /// Check if this event came from scrollback history.
    #[must_use]
    pub fn is_history(&self) -> bool {
        self.source == EventSource::History
    }

    /// Check if this event came from screen stability.
    #[must_use]
    pub fn is_screen_stable(&self) -> bool {
        self.source == EventSource::ScreenStable
    }

    /// Convert to the wire-level representation.
    #[must_use]
    pub fn to_wire(&self) -> WireEvent {
        WireEvent {
            event_type: "append".to_string(),
            text: self.text.clone(),
            meta: WireMeta {
                timestamp_utc: self.timestamp.to_rfc3339(),
                source: self.source.wire_name().to_string(),
            },
        }
    }

    /// Serialize to the wire-level JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.to_wire())
    }
}

/// Wire-level encoding of a transcript event.
///
/// `event_type` stays a plain string so consumers round-tripping events they
/// do not understand preserve them unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireEvent {
    /// Event type discriminator; `"append"` for every event emitted today.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Normalized line text, `\n`-terminated.
    pub text: String,
    /// Event metadata.
    pub meta: WireMeta,
}

/// Metadata carried alongside a wire event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireMeta {
    /// RFC3339 emission timestamp.
    #[serde(rename = "timestampUtc")]
    pub timestamp_utc: String,
    /// `"SCROLLBACK"` or `"SCREEN_STABLE"`.
    pub source: String,
}

/// Notification that terminal state changed and listeners should re-read
/// the view.
///
/// At most one damage event is fired per `feed` call. The row range covers
/// the union of touched screen rows; on a full redraw it spans the whole
/// screen.
#[derive(Debug, Clone, Copy)]
pub struct DamageEvent {
    /// Monotonic instant the damage was observed. The capture engine uses
    /// this as "now" for stability arithmetic, keeping it deterministic
    /// under test.
    pub at: Instant,
    /// First changed screen row (inclusive).
    pub changed_row_start: usize,
    /// Past-the-end changed screen row (exclusive).
    pub changed_row_end: usize,
    /// True when the change included a full screen clear, a buffer switch,
    /// or a resize. Triggers an epoch bump in the capture engine.
    pub full_redraw: bool,
}

impl DamageEvent {
    /// Damage covering the whole screen, marked as a full redraw.
    #[must_use]
    pub fn full(rows: usize) -> Self {
        Self {
            at: Instant::now(),
            changed_row_start: 0,
            changed_row_end: rows,
            full_redraw: true,
        }
    }

    /// Damage covering a row range without a full redraw.
    #[must_use]
    pub fn rows(start: usize, end: usize) -> Self {
        Self {
            at: Instant::now(),
            changed_row_start: start,
            changed_row_end: end,
            full_redraw: false,
        }
    }

    /// True when no rows changed (a feed that only moved the cursor).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed_row_start >= self.changed_row_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_event_is_stamped_and_tagged() {
        let event = TranscriptEvent::append("hello\n", EventSource::History);
        assert_eq!(event.kind, EventKind::Append);
        assert_eq!(event.text, "hello\n");
        assert!(event.is_history());
        assert!(!event.is_screen_stable());
    }

    #[test]
    fn source_predicates_are_exclusive() {
        let history = TranscriptEvent::append("a\n", EventSource::History);
        let stable = TranscriptEvent::append("b\n", EventSource::ScreenStable);
        assert!(history.is_history() && !history.is_screen_stable());
        assert!(stable.is_screen_stable() && !stable.is_history());
    }

    #[test]
    fn wire_shape_matches_contract() {
        let event = TranscriptEvent::append("line\n", EventSource::ScreenStable);
        let value: serde_json::Value =
            serde_json::from_str(&event.to_json().expect("serialize event")).expect("valid json");
        assert_eq!(value["type"], "append");
        assert_eq!(value["text"], "line\n");
        assert_eq!(value["meta"]["source"], "SCREEN_STABLE");
        // RFC3339 timestamps carry a date-time separator.
        assert!(value["meta"]["timestampUtc"]
            .as_str()
            .expect("timestamp string")
            .contains('T'));
    }

    #[test]
    fn wire_source_names() {
        assert_eq!(EventSource::History.wire_name(), "SCROLLBACK");
        assert_eq!(EventSource::ScreenStable.wire_name(), "SCREEN_STABLE");
    }

    #[test]
    fn unknown_wire_type_roundtrips() {
        let json = r#"{"type":"reset","text":"","meta":{"timestampUtc":"2026-03-01T00:00:00Z","source":"SCROLLBACK"}}"#;
        let wire: WireEvent = serde_json::from_str(json).expect("deserialize wire event");
        assert_eq!(wire.event_type, "reset");
        let back = serde_json::to_string(&wire).expect("serialize wire event");
        assert!(back.contains(r#""type":"reset""#));
    }

    #[test]
    fn damage_full_covers_screen() {
        let damage = DamageEvent::full(24);
        assert!(damage.full_redraw);
        assert_eq!(damage.changed_row_start, 0);
        assert_eq!(damage.changed_row_end, 24);
        assert!(!damage.is_empty());
    }

    #[test]
    fn damage_rows_is_partial() {
        let damage = DamageEvent::rows(3, 5);
        assert!(!damage.full_redraw);
        assert!(!damage.is_empty());
        assert!(DamageEvent::rows(4, 4).is_empty());
    }
}
