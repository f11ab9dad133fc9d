//! Merging freshly analysed events into existing main tracks.
//!
//! Used when a recording grows and only its new tail is analysed. The tail
//! is analysed with some look-back so note attacks near the old end are
//! caught; these functions decide what the main tracks receive.

use serde::Serialize;

use crate::track::Event;

/// Changes to apply to a notes track.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoteMerge {
    /// Existing note to remove before adding
    pub remove: Option<Event>,
    /// Notes to add, in absolute frames
    pub add: Vec<Event>,
}

/// Events to append to the main pitch track.
///
/// Pitch results carry absolute frames and are appended as they are.
/// Frames repeated inside the look-back overlap are kept; the pitch track
/// tolerates duplicate frames.
pub fn merge_pitch_track(incoming: &[Event]) -> Vec<Event> {
    incoming.to_vec()
}

/// Merge notes analysed from `context_start` onwards into `existing`.
///
/// Incoming note frames are relative to the analysis context and are
/// shifted to absolute frames first. If the first incoming note starts
/// strictly inside the last existing note, the two are joined: the
/// existing note is removed and the first incoming note is replaced by the
/// existing note stretched to the incoming note's end. Notes that merely
/// touch or do not overlap are left separate.
pub fn merge_notes(existing: &[Event], incoming: &[Event], context_start: i64) -> NoteMerge {
    let mut add: Vec<Event> = incoming
        .iter()
        .map(|note| note.with_frame(note.frame + context_start))
        .collect();

    let (Some(prev), Some(next)) = (existing.last(), add.first()) else {
        return NoteMerge { remove: None, add };
    };

    let prev_end = prev.frame + prev.duration;
    if next.frame < prev_end && next.frame > prev.frame {
        let overlap = prev_end - next.frame;
        let duration = prev.duration + next.duration - overlap;
        let merged = prev.with_duration(duration);
        add[0] = merged;
        return NoteMerge {
            remove: Some(prev.clone()),
            add,
        };
    }

    NoteMerge { remove: None, add }
}
