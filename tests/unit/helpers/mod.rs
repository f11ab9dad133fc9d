//! Test helper utilities

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use intone::config::Config;
use intone::document::{Document, MemoryDocument, PaneId};
use intone::engine::{AnalysisEngine, CompletionHandler, JobBatch, JobId};
use intone::reanalysis::{MainModel, ReAnalysisCoordinator, SessionContext};
use intone::track::{Component, Event, TrackId, TrackKind};

pub const PANE: PaneId = PaneId(1);
pub const SAMPLE_RATE: u32 = 44100;

/// Engine that keeps submitted batches until the test delivers them.
#[derive(Default)]
pub struct RecordingEngine {
    submitted: Mutex<Vec<(JobBatch, Arc<dyn CompletionHandler>)>>,
    cancelled: Mutex<Vec<JobId>>,
    missing: Vec<String>,
}

impl RecordingEngine {
    pub fn without(missing: &[&str]) -> Self {
        Self {
            missing: missing.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn batches(&self) -> Vec<JobBatch> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .map(|(batch, _)| batch.clone())
            .collect()
    }

    pub fn cancelled(&self) -> Vec<JobId> {
        self.cancelled.lock().unwrap().clone()
    }

    /// Complete the `index`th submitted batch.
    pub fn deliver(&self, index: usize, primary: Vec<TrackId>, auxiliary: Vec<TrackId>) {
        let (id, handler) = {
            let submitted = self.submitted.lock().unwrap();
            let (batch, handler) = &submitted[index];
            (batch.id, Arc::clone(handler))
        };
        handler.on_job_complete(id, primary, auxiliary);
    }
}

impl AnalysisEngine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    fn has_capability(&self, transform: &str) -> bool {
        !self.missing.iter().any(|m| m == transform)
    }

    fn submit(&self, batch: JobBatch, handler: Arc<dyn CompletionHandler>) {
        self.submitted.lock().unwrap().push((batch, handler));
    }

    fn cancel(&self, id: JobId) {
        self.cancelled.lock().unwrap().push(id);
    }
}

/// A document with a main pitch track, a coordinator and a recording engine.
pub struct Session {
    pub doc: Arc<MemoryDocument>,
    pub engine: Arc<RecordingEngine>,
    pub coordinator: ReAnalysisCoordinator,
    pub pitch: TrackId,
    pub notes: TrackId,
}

/// Pitch events every 256 frames over `[0, frames)` at `hz`.
pub fn flat_pitch(frames: i64, hz: f64) -> Vec<Event> {
    (0..frames).step_by(256).map(|f| Event::pitch(f, hz)).collect()
}

pub fn session_with(engine: RecordingEngine, notes: Vec<Event>) -> Session {
    session_on(MemoryDocument::new(), engine, notes)
}

/// Like [`session_with`], on a caller-configured document.
pub fn session_on(doc: MemoryDocument, engine: RecordingEngine, notes: Vec<Event>) -> Session {
    let doc = Arc::new(doc);
    let pitch = doc.create_track(TrackKind::Pitch, flat_pitch(8192, 200.0));
    let notes = doc.create_track(TrackKind::Notes, notes);
    doc.add_track_to_view(PANE, pitch);
    doc.add_track_to_view(PANE, notes);

    let engine = Arc::new(engine);
    let coordinator = ReAnalysisCoordinator::new(engine.clone(), Config::default());
    doc.add_listener(coordinator.track_listener());
    coordinator.attach(
        SessionContext::new(doc.clone())
            .pane(PANE)
            .model(MainModel {
                sample_rate: SAMPLE_RATE,
                frames: 8192,
            })
            .track(Component::PitchTrack, pitch)
            .track(Component::Notes, notes),
    );

    Session {
        doc,
        engine,
        coordinator,
        pitch,
        notes,
    }
}

pub fn session() -> Session {
    session_with(RecordingEngine::default(), Vec::new())
}

impl Session {
    /// Create candidate tracks with constant pitch over `[from, to)`.
    pub fn candidate_tracks(&self, from: i64, to: i64, values: &[f64]) -> Vec<TrackId> {
        values
            .iter()
            .map(|hz| {
                let events = (from..to).step_by(256).map(|f| Event::pitch(f, *hz)).collect();
                self.doc.create_track(TrackKind::Pitch, events)
            })
            .collect()
    }

    pub fn pitch_events(&self) -> Vec<Event> {
        self.doc.all_events(self.pitch).unwrap()
    }
}
