//! Coordinator driven by the threaded engine

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use intone::config::Config;
use intone::document::{Document, MemoryDocument, PaneId};
use intone::engine::{AnalysisJob, FeatureSource, OutputKind, SimulatedEngine};
use intone::reanalysis::{CoordinatorState, MainModel, ReAnalysisCoordinator, SessionContext};
use intone::timeline::{FrequencyRange, Selection};
use intone::track::{Component, Event, TrackKind};

const PANE: PaneId = PaneId(7);
const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Two candidates on the selection's hops, 300 Hz and 150 Hz.
fn candidate_source() -> Arc<dyn FeatureSource> {
    Arc::new(|job: &AnalysisJob| -> Vec<Vec<Event>> {
        match job.output {
            OutputKind::PitchCandidates => [300.0, 150.0]
                .iter()
                .map(|hz| {
                    (job.selection.start_frame()..job.selection.end_frame())
                        .step_by(256)
                        .map(|f| Event::pitch(f, *hz))
                        .collect()
                })
                .collect(),
            _ => vec![Vec::new()],
        }
    })
}

struct Rig {
    doc: Arc<MemoryDocument>,
    engine: Arc<SimulatedEngine>,
    coordinator: ReAnalysisCoordinator,
    pitch: intone::TrackId,
}

fn rig(latency: Duration, workers: usize) -> Rig {
    let doc = Arc::new(MemoryDocument::new());
    let pitch = doc.create_track(
        TrackKind::Pitch,
        (0..16384).step_by(256).map(|f| Event::pitch(f, 200.0)).collect(),
    );
    doc.add_track_to_view(PANE, pitch);

    let config = Config::default();
    let capabilities = vec![config.engine.candidates_transform.id.clone()];
    let engine = Arc::new(
        SimulatedEngine::new(doc.clone(), candidate_source(), capabilities, workers)
            .unwrap()
            .with_latency(latency),
    );
    let coordinator = ReAnalysisCoordinator::new(engine.clone(), config);
    doc.add_listener(coordinator.track_listener());
    coordinator.attach(
        SessionContext::new(doc.clone())
            .pane(PANE)
            .model(MainModel {
                sample_rate: 44100,
                frames: 16384,
            })
            .track(Component::PitchTrack, pitch),
    );

    Rig {
        doc,
        engine,
        coordinator,
        pitch,
    }
}

/// Every candidate event lies in the active selection.
fn candidates_match_active_selection(rig: &Rig) -> bool {
    let active = rig.coordinator.active_selection();
    rig.coordinator.candidates().iter().all(|track| {
        rig.doc
            .all_events(*track)
            .unwrap()
            .iter()
            .all(|e| active.contains(e.frame))
    })
}

#[test]
fn single_request_produces_candidates() {
    let rig = rig(Duration::ZERO, 2);
    rig.coordinator
        .reanalyse_selection(Selection::new(2048, 4096), FrequencyRange::unconstrained())
        .unwrap();
    assert!(rig.engine.wait_idle(IDLE_TIMEOUT));

    assert_eq!(rig.coordinator.state(), CoordinatorState::CandidatesReady);
    assert_eq!(rig.coordinator.candidates().len(), 2);
    assert_eq!(rig.coordinator.outstanding_job(), None);
    assert!(candidates_match_active_selection(&rig));
}

#[test]
fn superseded_request_never_surfaces() {
    let rig = rig(Duration::from_millis(50), 2);
    rig.coordinator
        .reanalyse_selection(Selection::new(2048, 4096), FrequencyRange::unconstrained())
        .unwrap();
    rig.coordinator
        .reanalyse_selection(Selection::new(8192, 12288), FrequencyRange::unconstrained())
        .unwrap();
    assert!(rig.engine.wait_idle(IDLE_TIMEOUT));

    assert_eq!(rig.coordinator.active_selection(), Selection::new(8192, 12288));
    assert_eq!(rig.coordinator.candidates().len(), 2);
    assert!(candidates_match_active_selection(&rig));
    // Main pitch track plus the two live candidates
    assert_eq!(rig.doc.tracks_in_view(PANE).len(), 3);
}

#[test]
fn concurrent_requests_settle_on_one_selection() {
    let rig = rig(Duration::from_millis(5), 4);
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let coordinator = rig.coordinator.clone();
            thread::spawn(move || {
                let start = 2048 + i * 1024;
                coordinator
                    .reanalyse_selection(
                        Selection::new(start, start + 2048),
                        FrequencyRange::unconstrained(),
                    )
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert!(rig.engine.wait_idle(IDLE_TIMEOUT));

    assert_eq!(rig.coordinator.state(), CoordinatorState::CandidatesReady);
    assert_eq!(rig.coordinator.candidates().len(), 2);
    assert!(candidates_match_active_selection(&rig));
}

#[test]
fn splice_after_threaded_delivery() {
    let rig = rig(Duration::ZERO, 1);
    let sel = Selection::new(4096, 6144);
    rig.coordinator
        .reanalyse_selection(sel, FrequencyRange::unconstrained())
        .unwrap();
    assert!(rig.engine.wait_idle(IDLE_TIMEOUT));

    rig.coordinator.switch_pitch_candidate(sel, false);
    let events = rig.doc.all_events(rig.pitch).unwrap();
    for e in events {
        let expected = if sel.contains(e.frame) { 150.0 } else { 200.0 };
        assert_eq!(e.value, Some(expected));
    }
}

#[test]
fn clear_while_in_flight_discards_result() {
    let rig = rig(Duration::from_millis(50), 1);
    rig.coordinator
        .reanalyse_selection(Selection::new(2048, 4096), FrequencyRange::unconstrained())
        .unwrap();
    rig.coordinator.clear_reanalysis();
    assert!(rig.engine.wait_idle(IDLE_TIMEOUT));

    assert_eq!(rig.coordinator.state(), CoordinatorState::Idle);
    assert!(rig.coordinator.candidates().is_empty());
    assert_eq!(rig.doc.tracks_in_view(PANE).len(), 1);
}

#[test]
fn dropped_coordinator_ignores_late_delivery() {
    let rig = rig(Duration::from_millis(20), 1);
    rig.coordinator
        .reanalyse_selection(Selection::new(2048, 4096), FrequencyRange::unconstrained())
        .unwrap();
    let Rig { doc, engine, .. } = rig;

    assert!(engine.wait_idle(IDLE_TIMEOUT));
    assert_eq!(doc.tracks_in_view(PANE).len(), 1);
}
