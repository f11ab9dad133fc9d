//! Track data: time-stamped estimate events and the stores holding them.
//!
//! # Module Structure
//!
//! - [`store`] - frame-ordered event storage for one track
//! - [`component`] - fixed slots for the session's logical components

pub mod component;
pub mod store;

pub use component::{Component, ComponentSlots, PlaybackState};
pub use store::EventStore;

use serde::{Deserialize, Serialize};

/// Stable identifier of a track owned by a document.
///
/// Identifiers are never reused within a document, so a stale id simply
/// resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(pub u64);

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "track#{}", self.0)
    }
}

/// What a track's events represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackKind {
    /// Sparse pitch estimates (frame, Hz)
    Pitch,
    /// Notes with duration and pitch
    Notes,
}

/// A single estimate on the timeline.
///
/// Pitch estimates carry a value and zero duration; notes carry a duration,
/// a pitch value and optionally a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub frame: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

fn is_zero(duration: &i64) -> bool {
    *duration == 0
}

impl Event {
    /// A pitch estimate in Hz.
    pub fn pitch(frame: i64, value: f64) -> Self {
        Self {
            frame,
            value: Some(value),
            duration: 0,
            label: None,
        }
    }

    /// A frame with no pitch value.
    pub fn unvoiced(frame: i64) -> Self {
        Self {
            frame,
            value: None,
            duration: 0,
            label: None,
        }
    }

    /// A note spanning `duration` frames.
    pub fn note(frame: i64, duration: i64, value: f64) -> Self {
        Self {
            frame,
            value: Some(value),
            duration,
            label: None,
        }
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// First frame after the event.
    pub fn end_frame(&self) -> i64 {
        self.frame + self.duration
    }

    pub fn with_frame(&self, frame: i64) -> Self {
        Self {
            frame,
            ..self.clone()
        }
    }

    pub fn with_value(&self, value: f64) -> Self {
        Self {
            value: Some(value),
            ..self.clone()
        }
    }

    pub fn with_duration(&self, duration: i64) -> Self {
        Self {
            duration,
            ..self.clone()
        }
    }

    pub fn with_label(&self, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..self.clone()
        }
    }
}

/// Immutable copy of a run of events, as taken from a track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSnapshot {
    events: Vec<Event>,
}

impl EventSnapshot {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Keep only events matching the predicate.
    pub fn filtered(&self, keep: impl Fn(&Event) -> bool) -> Self {
        Self {
            events: self.events.iter().filter(|e| keep(e)).cloned().collect(),
        }
    }

    /// Apply a transformation to every event.
    pub fn mapped(&self, f: impl Fn(&Event) -> Event) -> Self {
        Self {
            events: self.events.iter().map(f).collect(),
        }
    }
}

impl From<Vec<Event>> for EventSnapshot {
    fn from(events: Vec<Event>) -> Self {
        Self::new(events)
    }
}
