//! Candidate bookkeeping.

use crate::track::TrackId;

/// Alternative pitch tracks from the latest re-analysis, plus a cursor.
///
/// The cursor starts unset. Once set it always indexes a live candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    candidates: Vec<TrackId>,
    current: Option<usize>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn tracks(&self) -> &[TrackId] {
        &self.candidates
    }

    pub fn contains(&self, track: TrackId) -> bool {
        self.candidates.contains(&track)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Track under the cursor.
    pub fn current(&self) -> Option<TrackId> {
        self.current.and_then(|i| self.candidates.get(i).copied())
    }

    pub fn push(&mut self, track: TrackId) {
        self.candidates.push(track);
    }

    /// Remove every candidate and reset the cursor, returning the tracks.
    pub fn take_all(&mut self) -> Vec<TrackId> {
        self.current = None;
        std::mem::take(&mut self.candidates)
    }

    /// Drop one candidate that is going away. Returns whether it was here.
    ///
    /// A cursor past the removed entry moves down with it; a cursor on the
    /// removed entry is reset.
    pub fn remove(&mut self, track: TrackId) -> bool {
        let Some(pos) = self.candidates.iter().position(|t| *t == track) else {
            return false;
        };
        self.candidates.remove(pos);
        self.current = match self.current {
            Some(i) if i == pos => None,
            Some(i) if i > pos => Some(i - 1),
            other => other,
        };
        true
    }

    /// Move the cursor one step, wrapping at either end.
    ///
    /// An unset cursor lands on the first candidate going up and on the
    /// last going down. Returns the new current track, or `None` if there
    /// are no candidates.
    pub fn step(&mut self, up: bool) -> Option<TrackId> {
        let n = self.candidates.len();
        if n == 0 {
            return None;
        }
        let next = match (self.current, up) {
            (None, true) => 0,
            (None, false) => n - 1,
            (Some(i), true) => (i + 1) % n,
            (Some(i), false) => (i + n - 1) % n,
        };
        self.current = Some(next);
        self.current()
    }

    pub fn has_higher(&self) -> bool {
        match self.current {
            _ if self.is_empty() => false,
            None => true,
            Some(i) => i + 1 < self.candidates.len(),
        }
    }

    pub fn has_lower(&self) -> bool {
        match self.current {
            _ if self.is_empty() => false,
            None => true,
            Some(i) => i > 0,
        }
    }
}
