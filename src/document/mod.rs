//! The document contract the re-analysis core works against.
//!
//! The document owns every track. The core only ever holds [`TrackId`]s
//! and goes back through the document for each read or write, so a track
//! that has disappeared in the meantime is an ordinary `None`/`false`.
//!
//! Mutations are expected to be journaled by the document. Callers group
//! related mutations with [`Document::begin_atomic_operation`] so that one
//! user action is one undo step; [`AtomicOperation`] is the scoped form.
//!
//! [`MemoryDocument`] is a complete in-process implementation used by the
//! replay command and the tests.

mod memory;

pub use memory::{MemoryDocument, TrackListener, DEFAULT_HISTORY_LIMIT};

use serde::{Deserialize, Serialize};

use crate::timeline::Selection;
use crate::track::{Event, EventSnapshot, TrackId, TrackKind};

/// Identifier of the view pane tracks are shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaneId(pub u64);

/// Presentation attributes applied to a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackStyle {
    /// Named colour from the palette
    pub colour: String,
    /// Name shown instead of the transform name
    pub presentation_name: Option<String>,
    /// Whether the track is sonified on playback
    pub audible: bool,
}

impl Default for TrackStyle {
    fn default() -> Self {
        Self {
            colour: "Black".to_string(),
            presentation_name: None,
            audible: true,
        }
    }
}

/// Operations the coordinator needs from the document layer.
///
/// Implementations must be safe to call from the engine's worker threads.
/// None of these methods may call back into the coordinator except
/// [`Document::delete_track`], which is allowed to notify listeners.
pub trait Document: Send + Sync {
    /// Kind of the track, or `None` if it does not exist.
    fn track_kind(&self, track: TrackId) -> Option<TrackKind>;

    /// Full extent of the track's events.
    fn track_extent(&self, track: TrackId) -> Option<Selection>;

    /// Analysis completion of the track in percent.
    fn completion(&self, track: TrackId) -> Option<u8>;

    /// Copy the events of `track` inside `sel`.
    fn copy_range(&self, track: TrackId, sel: Selection) -> Option<EventSnapshot>;

    /// Copy every event of `track`.
    fn all_events(&self, track: TrackId) -> Option<Vec<Event>>;

    /// Delete the events of `track` inside `sel`.
    fn delete_range(&self, track: TrackId, sel: Selection) -> bool;

    /// Add the snapshot's events to `track`, shifted by `offset` frames.
    fn paste_snapshot(&self, track: TrackId, snapshot: &EventSnapshot, offset: i64) -> bool;

    /// Add individual events to `track`.
    fn add_events(&self, track: TrackId, events: &[Event]) -> bool;

    /// Remove one event equal to `event` from `track`.
    fn remove_event(&self, track: TrackId, event: &Event) -> bool;

    /// Extend the nominal end of a track.
    fn extend_end_frame(&self, track: TrackId, frame: i64) -> bool;

    /// Show a track in a pane.
    fn add_track_to_view(&self, pane: PaneId, track: TrackId) -> bool;

    /// Take a track out of the view. Undo-able; the document may release
    /// the track at some point after the removal can no longer be undone.
    fn remove_track(&self, pane: PaneId, track: TrackId) -> bool;

    /// Dispose of a track immediately. Not undo-able.
    fn delete_track(&self, track: TrackId);

    /// Show or hide a track in a pane. Undo-able.
    fn set_track_visible(&self, pane: PaneId, track: TrackId, visible: bool) -> bool;

    /// Apply presentation attributes.
    fn set_track_style(&self, track: TrackId, style: &TrackStyle) -> bool;

    /// Open a compound operation. Nested calls join the outermost one.
    fn begin_atomic_operation(&self, label: &str);

    /// Close the innermost compound operation.
    fn end_atomic_operation(&self);
}

/// Scoped compound operation; ends when dropped.
pub struct AtomicOperation<'a> {
    document: &'a dyn Document,
}

impl<'a> AtomicOperation<'a> {
    pub fn begin(document: &'a dyn Document, label: &str) -> Self {
        document.begin_atomic_operation(label);
        Self { document }
    }
}

impl Drop for AtomicOperation<'_> {
    fn drop(&mut self) {
        self.document.end_atomic_operation();
    }
}
