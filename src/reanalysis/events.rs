//! Notifications emitted by the coordinator.

use serde::Serialize;

use crate::engine::JobId;
use crate::timeline::Selection;

/// Something observers may want to redraw for.
///
/// Every event is sent after the state it describes is fully in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum CoordinatorEvent {
    /// A re-analysis result was ingested. Sent once per accepted batch.
    CandidatesChanged { id: JobId, count: usize },
    /// Candidate visibility was (re-)applied.
    CandidateVisibilityChanged { visible: bool },
    /// The candidates were disposed of.
    CandidatesCleared,
    /// A candidate was spliced into the main pitch track.
    CandidateSwitched { index: usize, selection: Selection },
    /// New recording frames were merged into the main tracks.
    RecordingMerged { id: JobId, pitch_events: usize, note_events: usize },
    /// The main pitch or notes track was replaced or edited.
    MainTrackChanged,
    /// The initial pitch and note analyses reached 100%.
    InitialAnalysisCompleted,
}
