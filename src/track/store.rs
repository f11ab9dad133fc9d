//! Frame-ordered event storage for a single track.

use super::{Event, EventSnapshot};
use crate::timeline::Selection;

/// Ordered collection of events for one track.
///
/// Events are kept sorted by frame. Several events may share a frame; they
/// keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStore {
    events: Vec<Event>,
    /// Nominal end of the track, at least the end of the last event
    end_frame: i64,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from unordered events.
    pub fn from_events(events: impl IntoIterator<Item = Event>) -> Self {
        let mut store = Self::new();
        for event in events {
            store.add(event);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Insert an event after any existing events on the same frame.
    pub fn add(&mut self, event: Event) {
        let idx = self.events.partition_point(|e| e.frame <= event.frame);
        self.end_frame = self.end_frame.max(event.end_frame());
        self.events.insert(idx, event);
    }

    /// Remove the first event equal to `event`. Returns whether one was found.
    pub fn remove(&mut self, event: &Event) -> bool {
        let first = self.events.partition_point(|e| e.frame < event.frame);
        let found = self.events[first..]
            .iter()
            .take_while(|e| e.frame == event.frame)
            .position(|e| e == event);

        match found {
            Some(offset) => {
                self.events.remove(first + offset);
                true
            }
            None => false,
        }
    }

    /// Events whose frame lies inside the selection.
    pub fn range(&self, sel: Selection) -> &[Event] {
        let (lo, hi) = self.bounds(sel);
        &self.events[lo..hi]
    }

    /// Copy the events inside the selection.
    pub fn copy_range(&self, sel: Selection) -> EventSnapshot {
        EventSnapshot::new(self.range(sel).to_vec())
    }

    /// Remove and return the events inside the selection.
    pub fn delete_range(&mut self, sel: Selection) -> Vec<Event> {
        let (lo, hi) = self.bounds(sel);
        self.events.drain(lo..hi).collect()
    }

    /// Add every event of a snapshot, shifted by `offset` frames.
    pub fn paste(&mut self, snapshot: &EventSnapshot, offset: i64) -> Vec<Event> {
        let pasted: Vec<Event> = snapshot
            .events()
            .iter()
            .map(|e| e.with_frame(e.frame + offset))
            .collect();
        for event in &pasted {
            self.add(event.clone());
        }
        pasted
    }

    pub fn all(&self) -> &[Event] {
        &self.events
    }

    pub fn first(&self) -> Option<&Event> {
        self.events.first()
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Frame of the first event, or 0 when empty.
    pub fn start_frame(&self) -> i64 {
        self.events.first().map(|e| e.frame).unwrap_or(0)
    }

    /// Nominal end frame: the furthest event end or an explicit extension.
    pub fn end_frame(&self) -> i64 {
        self.end_frame
    }

    /// Extend the nominal end so the track spans at least to `frame`.
    pub fn extend_end_frame(&mut self, frame: i64) {
        self.end_frame = self.end_frame.max(frame);
    }

    /// Full extent of the track as a selection.
    ///
    /// The end is one past the last event frame so that a zero-duration
    /// event on the final frame is still covered.
    pub fn extent(&self) -> Selection {
        let last = self.events.last().map(|e| e.frame + 1).unwrap_or(0);
        Selection::new(self.start_frame(), self.end_frame.max(last))
    }

    fn bounds(&self, sel: Selection) -> (usize, usize) {
        let lo = self.events.partition_point(|e| e.frame < sel.start_frame());
        let hi = self.events.partition_point(|e| e.frame < sel.end_frame());
        (lo, hi.max(lo))
    }
}
