//! Scripted sessions.
//!
//! A replay script describes a recording, its initial pitch and note
//! tracks, what the simulated engine should produce, and a list of user
//! actions. [`run`] drives a [`ReAnalysisCoordinator`] through the actions
//! against a [`MemoryDocument`] and a [`SimulatedEngine`] and reports the
//! resulting tracks.
//!
//! ```toml
//! sample_rate = 44100
//! frames = 8192
//! pitch_fill = 220.0
//!
//! [engine]
//! candidates = [330.0, 110.0]
//!
//! [[steps]]
//! action = "reanalyse"
//! start = 2048
//! end = 4096
//!
//! [[steps]]
//! action = "switch"
//! start = 2048
//! end = 4096
//! ```

use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::document::{Document, MemoryDocument, PaneId};
use crate::engine::{AnalysisJob, EngineError, FeatureSource, OutputKind, SimulatedEngine};
use crate::reanalysis::{
    CoordinatorEvent, CoordinatorState, MainModel, ReAnalysisCoordinator, SessionContext,
};
use crate::timeline::{FrequencyRange, Selection};
use crate::track::{Component, Event, TrackId, TrackKind};

/// How long to wait for the engine after each step
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors loading or running a script.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read script {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid script: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Analysis engine did not finish within {0:?}")]
    Timeout(Duration),
}

/// A scripted session.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Length of the recording in frames
    pub frames: i64,
    /// Initial main pitch track
    #[serde(default)]
    pub pitch: Vec<Event>,
    /// Fill the pitch track with this value on every hop when `pitch` is empty
    #[serde(default)]
    pub pitch_fill: Option<f64>,
    /// Initial notes track
    #[serde(default)]
    pub notes: Vec<Event>,
    #[serde(default)]
    pub engine: EngineScript,
    /// Wait for the engine after every step
    #[serde(default = "default_settle")]
    pub settle: bool,
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_settle() -> bool {
    true
}

/// What the simulated engine produces.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineScript {
    /// One candidate per value, in Hz
    #[serde(default)]
    pub candidates: Vec<f64>,
    /// Pitch reported for recording tails
    #[serde(default)]
    pub recording_pitch: Option<f64>,
    /// Length of the notes reported for recording tails
    #[serde(default)]
    pub recording_note_frames: Option<i64>,
    /// Transforms the engine pretends are not installed
    #[serde(default)]
    pub missing: Vec<String>,
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(default)]
    pub workers: Option<usize>,
}

/// One user action.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    Reanalyse {
        start: i64,
        end: i64,
        #[serde(default)]
        min_freq: f64,
        #[serde(default)]
        max_freq: f64,
    },
    Region {
        start: i64,
        end: i64,
        #[serde(default)]
        min_freq: f64,
        #[serde(default)]
        max_freq: f64,
    },
    Show {
        shown: bool,
    },
    Switch {
        start: i64,
        end: i64,
        #[serde(default = "default_up")]
        up: bool,
    },
    Materialise,
    Abandon {
        start: i64,
        end: i64,
    },
    Clear,
    ShiftOctave {
        start: i64,
        end: i64,
        #[serde(default = "default_up")]
        up: bool,
    },
    DeletePitches {
        start: i64,
        end: i64,
    },
    TakeFrom {
        events: Vec<Event>,
    },
    RecordToEnd {
        frames: i64,
    },
    Undo,
}

fn default_up() -> bool {
    true
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Reanalyse { .. } => "reanalyse",
            Step::Region { .. } => "region",
            Step::Show { .. } => "show",
            Step::Switch { .. } => "switch",
            Step::Materialise => "materialise",
            Step::Abandon { .. } => "abandon",
            Step::Clear => "clear",
            Step::ShiftOctave { .. } => "shift-octave",
            Step::DeletePitches { .. } => "delete-pitches",
            Step::TakeFrom { .. } => "take-from",
            Step::RecordToEnd { .. } => "record-to-end",
            Step::Undo => "undo",
        }
    }
}

impl Script {
    pub fn parse(contents: &str) -> Result<Self, ReplayError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ReplayError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    fn initial_pitch(&self, step: i64) -> Vec<Event> {
        match (self.pitch.is_empty(), self.pitch_fill) {
            (true, Some(hz)) => (0..self.frames.max(0))
                .step_by(step.max(1) as usize)
                .map(|frame| Event::pitch(frame, hz))
                .collect(),
            _ => self.pitch.clone(),
        }
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub action: &'static str,
    /// Error message, if the step failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// State after the last step.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub state: CoordinatorState,
    pub candidates: usize,
    pub current_candidate: Option<usize>,
    pub candidates_visible: bool,
    pub active_selection: Selection,
    pub analysed_frames: i64,
    pub pitch: Vec<Event>,
    pub notes: Vec<Event>,
    pub steps: Vec<StepOutcome>,
    pub events: Vec<CoordinatorEvent>,
    pub history: Vec<String>,
}

/// Events the simulated engine reports for a script.
struct ScriptSource {
    step: i64,
    candidates: Vec<f64>,
    recording_pitch: f64,
    recording_note_frames: i64,
}

impl ScriptSource {
    /// Hop-aligned frames from `start` up to `end`.
    fn hops(&self, start: i64, end: i64) -> impl Iterator<Item = i64> {
        let first = start.div_euclid(self.step) * self.step;
        let first = if first < start { first + self.step } else { first };
        (first..end.max(first)).step_by(self.step as usize)
    }
}

impl FeatureSource for ScriptSource {
    fn extract(&self, job: &AnalysisJob) -> Vec<Vec<Event>> {
        match job.output {
            // Reported on the selection's hops, i.e. with the lag already compensated
            OutputKind::PitchCandidates => self
                .candidates
                .iter()
                .map(|hz| {
                    self.hops(job.selection.start_frame(), job.selection.end_frame())
                        .map(|frame| Event::pitch(frame, *hz))
                        .collect()
                })
                .collect(),
            OutputKind::PitchTrack => vec![self
                .hops(job.window.start, job.window.end)
                .map(|frame| Event::pitch(frame, self.recording_pitch))
                .collect()],
            // Note frames are relative to the analysis context
            OutputKind::Notes => {
                let len = self.recording_note_frames.max(1);
                let span = job.window.frames();
                vec![(0..span.max(0))
                    .step_by(len as usize)
                    .map(|frame| Event::note(frame, len.min(span - frame), self.recording_pitch))
                    .collect()]
            }
        }
    }
}

/// Run a script.
pub fn run(script: &Script, config: &Config) -> Result<ReplayReport, ReplayError> {
    let step = i64::from(config.engine.step_size.max(1));
    let document = Arc::new(MemoryDocument::new());
    let pane = PaneId(1);

    let pitch = document.create_track(TrackKind::Pitch, script.initial_pitch(step));
    let notes = document.create_track(TrackKind::Notes, script.notes.clone());
    document.add_track_to_view(pane, pitch);
    document.add_track_to_view(pane, notes);

    let source = ScriptSource {
        step,
        candidates: script.engine.candidates.clone(),
        recording_pitch: script.engine.recording_pitch.unwrap_or(220.0),
        recording_note_frames: script.engine.recording_note_frames.unwrap_or(4096),
    };
    let capabilities: Vec<String> = [
        &config.engine.pitch_transform,
        &config.engine.notes_transform,
        &config.engine.candidates_transform,
        &config.engine.constrained_transform,
    ]
    .into_iter()
    .map(|t| t.id.clone())
    .filter(|id| !script.engine.missing.contains(id))
    .collect();

    let engine = Arc::new(
        SimulatedEngine::new(
            Arc::clone(&document),
            Arc::new(source),
            capabilities,
            script
                .engine
                .workers
                .unwrap_or(crate::engine::simulated::DEFAULT_WORKERS),
        )?
        .with_latency(Duration::from_millis(script.engine.latency_ms)),
    );

    let coordinator = ReAnalysisCoordinator::new(engine.clone(), config.clone());
    let events = coordinator.subscribe();
    document.add_listener(coordinator.track_listener());
    coordinator.attach(
        SessionContext::new(document.clone())
            .pane(pane)
            .model(MainModel {
                sample_rate: script.sample_rate,
                frames: script.frames,
            })
            .track(Component::PitchTrack, pitch)
            .track(Component::Notes, notes),
    );

    let mut outcomes = Vec::with_capacity(script.steps.len());
    for step in &script.steps {
        debug!(action = step.name(), "replaying step");
        let error = apply(&coordinator, &document, step).err();
        if script.settle && !engine.wait_idle(SETTLE_TIMEOUT) {
            return Err(ReplayError::Timeout(SETTLE_TIMEOUT));
        }
        document.release_expired();
        outcomes.push(StepOutcome {
            action: step.name(),
            error,
        });
    }
    if !engine.wait_idle(SETTLE_TIMEOUT) {
        return Err(ReplayError::Timeout(SETTLE_TIMEOUT));
    }

    Ok(ReplayReport {
        state: coordinator.state(),
        candidates: coordinator.candidates().len(),
        current_candidate: coordinator.current_candidate(),
        candidates_visible: coordinator.pitch_candidates_shown(),
        active_selection: coordinator.active_selection(),
        analysed_frames: coordinator.analysed_frames(),
        pitch: events_of(&document, coordinator.main_track(Component::PitchTrack)),
        notes: events_of(&document, coordinator.main_track(Component::Notes)),
        steps: outcomes,
        events: drain(&events),
        history: document.history(),
    })
}

fn apply(
    coordinator: &ReAnalysisCoordinator,
    document: &MemoryDocument,
    step: &Step,
) -> Result<(), String> {
    match step {
        Step::Reanalyse {
            start,
            end,
            min_freq,
            max_freq,
        } => coordinator
            .reanalyse_selection(
                Selection::new(*start, *end),
                FrequencyRange::new(*min_freq, *max_freq),
            )
            .map_err(|e| e.to_string())?,
        Step::Region {
            start,
            end,
            min_freq,
            max_freq,
        } => coordinator.reanalyse_region(*start, *end, *min_freq, *max_freq),
        Step::Show { shown } => coordinator.show_pitch_candidates(*shown),
        Step::Switch { start, end, up } => {
            coordinator.switch_pitch_candidate(Selection::new(*start, *end), *up)
        }
        Step::Materialise => coordinator.materialise_reanalysis(),
        Step::Abandon { start, end } => {
            document.begin_atomic_operation("Abandon Re-Analysis");
            coordinator.abandon_reanalysis(Selection::new(*start, *end));
            document.end_atomic_operation();
        }
        Step::Clear => coordinator.clear_reanalysis(),
        Step::ShiftOctave { start, end, up } => {
            coordinator.shift_octave(Selection::new(*start, *end), *up)
        }
        Step::DeletePitches { start, end } => {
            coordinator.delete_pitches(Selection::new(*start, *end))
        }
        Step::TakeFrom { events } => {
            let other = document.create_track(TrackKind::Pitch, events.clone());
            coordinator.take_pitch_track_from(other);
        }
        Step::RecordToEnd { frames } => coordinator
            .analyse_recording_to_end(*frames)
            .map_err(|e| e.to_string())?,
        Step::Undo => {
            document.undo();
        }
    }
    Ok(())
}

fn events_of(document: &MemoryDocument, track: Option<TrackId>) -> Vec<Event> {
    track
        .and_then(|t| document.all_events(t))
        .unwrap_or_default()
}

fn drain(events: &Receiver<CoordinatorEvent>) -> Vec<CoordinatorEvent> {
    events.try_iter().collect()
}
