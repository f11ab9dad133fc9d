//! Re-analysis coordination.
//!
//! [`ReAnalysisCoordinator`] owns the one outstanding re-analysis request,
//! the candidate tracks it produced and the splice of a chosen candidate
//! into the main pitch track. It also drives incremental analysis of a
//! growing recording.
//!
//! # Threading
//!
//! Entry points are called from the control thread; completions arrive on
//! engine threads. All coordinator state lives behind one mutex. The mutex
//! is released before calling [`AnalysisEngine::submit`],
//! [`AnalysisEngine::cancel`], [`Document::delete_track`] or sending
//! notifications, since each of those may come back into the coordinator.
//!
//! Every submitted batch gets a fresh [`JobId`] from a generation counter.
//! A completion is acted on only if its id is still the outstanding one;
//! this check lives in a single place (`Shared::accept_completion`).
//!
//! # Module Structure
//!
//! - [`candidates`] - candidate list and cursor
//! - [`error`] - user-facing error type
//! - [`events`] - observer notifications
//! - [`merge`] - merging tail analysis into the main tracks

pub mod candidates;
pub mod error;
pub mod events;
pub mod merge;

pub use candidates::CandidateSet;
pub use error::CoordinatorError;
pub use events::CoordinatorEvent;
pub use merge::{merge_notes, merge_pitch_track, NoteMerge};

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::document::{AtomicOperation, Document, PaneId, TrackListener};
use crate::engine::{
    AnalysisEngine, AnalysisJob, CompletionHandler, JobBatch, JobId, OutputKind, TransformSpec,
};
use crate::timeline::{AnalysisWindow, FrequencyRange, Selection};
use crate::track::{
    Component, ComponentSlots, Event, EventSnapshot, PlaybackState, TrackId, TrackKind,
};

/// The audio the annotations belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MainModel {
    pub sample_rate: u32,
    /// Length of the recording in frames
    pub frames: i64,
}

/// Where the coordinator is in the request/ingest cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoordinatorState {
    #[default]
    Idle,
    /// A re-analysis batch has been submitted and not yet ingested
    Requesting,
    /// Candidates from the latest request are available
    CandidatesReady,
}

/// Everything needed to work on a freshly loaded recording.
#[derive(Clone)]
pub struct SessionContext {
    pub document: Arc<dyn Document>,
    pub pane: Option<PaneId>,
    pub model: Option<MainModel>,
    pub tracks: ComponentSlots<TrackId>,
}

impl SessionContext {
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self {
            document,
            pane: None,
            model: None,
            tracks: ComponentSlots::new(),
        }
    }

    pub fn pane(mut self, pane: PaneId) -> Self {
        self.pane = Some(pane);
        self
    }

    pub fn model(mut self, model: MainModel) -> Self {
        self.model = Some(model);
        self
    }

    pub fn track(mut self, component: Component, track: TrackId) -> Self {
        self.tracks.set(component, track);
        self
    }
}

/// A recording-tail batch waiting to be merged.
#[derive(Debug, Clone, Copy)]
struct PendingMerge {
    id: JobId,
    context_start: i64,
    end_frame: i64,
}

#[derive(Default)]
struct Session {
    document: Option<Arc<dyn Document>>,
    pane: Option<PaneId>,
    model: Option<MainModel>,
    tracks: ComponentSlots<TrackId>,

    state: CoordinatorState,
    active_selection: Selection,
    active_range: FrequencyRange,
    outstanding: Option<JobId>,
    candidates: CandidateSet,
    candidates_visible: bool,
    pre_analysis: EventSnapshot,

    analysed_frames: i64,
    pending_merges: Vec<PendingMerge>,
}

/// Resolved document, pane and model.
struct Context {
    document: Arc<dyn Document>,
    pane: PaneId,
    model: MainModel,
}

impl Session {
    fn context(&self) -> Result<Context, CoordinatorError> {
        let document = self.document.clone().ok_or(CoordinatorError::NoDocument)?;
        let pane = self.pane.ok_or(CoordinatorError::NoActivePane)?;
        let model = self.model.ok_or(CoordinatorError::NoMainModel)?;
        Ok(Context {
            document,
            pane,
            model,
        })
    }

    fn pitch_track(&self) -> Option<TrackId> {
        self.tracks.get(Component::PitchTrack)
    }

    fn notes_track(&self) -> Option<TrackId> {
        self.tracks.get(Component::Notes)
    }

    /// Take the candidates out of view and forget the active request.
    ///
    /// Does not open an atomic operation; callers decide the grouping.
    /// Returns whether any candidate was discarded.
    fn discard_candidates(&mut self, document: &dyn Document, pane: PaneId) -> bool {
        let discarded = self.candidates.take_all();
        for track in &discarded {
            document.remove_track(pane, *track);
        }
        self.active_selection = Selection::empty();
        self.active_range = FrequencyRange::unconstrained();
        self.candidates_visible = false;
        if self.outstanding.is_none() {
            self.state = CoordinatorState::Idle;
        }
        !discarded.is_empty()
    }

    /// Show or hide every candidate and record the flag.
    fn apply_visibility(&mut self, document: &dyn Document, pane: PaneId, shown: bool) {
        for track in self.candidates.tracks() {
            document.set_track_visible(pane, *track, shown);
        }
        self.candidates_visible = shown;
    }
}

struct Shared {
    engine: Arc<dyn AnalysisEngine>,
    config: Config,
    session: Mutex<Session>,
    events: Mutex<Option<Sender<CoordinatorEvent>>>,
    generation: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_job_id(&self) -> JobId {
        JobId(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn notify(&self, event: CoordinatorEvent) {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = events.as_ref() {
            if tx.send(event).is_err() {
                // Receiver went away
                *events = None;
            }
        }
    }

    /// The single entry point for finished batches.
    fn accept_completion(&self, id: JobId, primary: Vec<TrackId>, auxiliary: Vec<TrackId>) {
        let delivered: Vec<TrackId> = primary.into_iter().chain(auxiliary).collect();
        let mut session = self.lock();

        if let Some(pos) = session.pending_merges.iter().position(|p| p.id == id) {
            let pending = session.pending_merges.remove(pos);
            drop(session);
            self.merge_recording(pending, delivered);
            return;
        }

        let stale = session.outstanding != Some(id) || session.active_selection.is_empty();
        let (document, pane) = match session.context() {
            Ok(ctx) if !stale => (ctx.document, ctx.pane),
            _ => {
                if session.outstanding == Some(id) {
                    session.outstanding = None;
                    session.state = CoordinatorState::Idle;
                }
                let document = session.document.clone();
                drop(session);
                warn!("{}", CoordinatorError::StaleResult { id });
                if let Some(document) = document {
                    for track in delivered {
                        document.delete_track(track);
                    }
                }
                return;
            }
        };

        session.outstanding = None;
        let style = self.config.candidates.style();
        let mut rejected = Vec::new();
        {
            let _op = AtomicOperation::begin(document.as_ref(), "Re-Analyse Selection");

            for track in session.candidates.take_all() {
                document.remove_track(pane, track);
            }

            for track in delivered {
                if document.track_kind(track) != Some(TrackKind::Pitch) {
                    rejected.push(track);
                    continue;
                }
                document.set_track_style(track, &style);
                document.add_track_to_view(pane, track);
                session.candidates.push(track);
            }

            if !session.candidates.is_empty() {
                // Flip the flag so the restore below is applied to every candidate
                let shown = session.candidates_visible;
                session.candidates_visible = !shown;
                session.apply_visibility(document.as_ref(), pane, shown);
            }
        }
        session.state = CoordinatorState::CandidatesReady;
        let count = session.candidates.len();
        let visible = session.candidates_visible;
        drop(session);

        for track in rejected {
            document.delete_track(track);
        }

        info!(%id, count, "ingested re-analysis candidates");
        self.notify(CoordinatorEvent::CandidateVisibilityChanged { visible });
        self.notify(CoordinatorEvent::CandidatesChanged { id, count });
    }

    /// Fold a recording-tail batch into the main tracks.
    fn merge_recording(&self, pending: PendingMerge, delivered: Vec<TrackId>) {
        let session = self.lock();
        let Some(document) = session.document.clone() else {
            return;
        };
        let pitch = session.pitch_track();
        let notes = session.notes_track();

        let mut pitch_events = 0;
        let mut note_events = 0;
        {
            let _op = AtomicOperation::begin(document.as_ref(), "Analyse Recording");
            for track in &delivered {
                let (Some(kind), Some(events)) =
                    (document.track_kind(*track), document.all_events(*track))
                else {
                    continue;
                };
                match (kind, pitch, notes) {
                    (TrackKind::Pitch, Some(target), _) => {
                        let add = merge_pitch_track(&events);
                        pitch_events += add.len();
                        document.add_events(target, &add);
                        document.extend_end_frame(target, pending.end_frame);
                    }
                    (TrackKind::Notes, _, Some(target)) => {
                        let existing = document.all_events(target).unwrap_or_default();
                        let merge = merge_notes(&existing, &events, pending.context_start);
                        if let Some(prev) = &merge.remove {
                            document.remove_event(target, prev);
                        }
                        note_events += merge.add.len();
                        document.add_events(target, &merge.add);
                        document.extend_end_frame(target, pending.end_frame);
                    }
                    _ => trace!(%track, ?kind, "no main track to merge into"),
                }
            }
        }
        drop(session);

        for track in delivered {
            document.delete_track(track);
        }

        info!(id = %pending.id, pitch_events, note_events, "merged recording analysis");
        self.notify(CoordinatorEvent::RecordingMerged {
            id: pending.id,
            pitch_events,
            note_events,
        });
    }

    /// Out-of-band disposal of a track.
    fn forget_track(&self, track: TrackId) {
        let mut session = self.lock();
        if session.candidates.remove(track) {
            debug!(%track, "candidate deleted by document");
        }
        for component in Component::ALL {
            if session.tracks.get(component) == Some(track) {
                session.tracks.take(component);
            }
        }
    }
}

/// Weak link from the engine and document back to the coordinator.
struct Link(Weak<Shared>);

impl CompletionHandler for Link {
    fn on_job_complete(&self, id: JobId, primary: Vec<TrackId>, auxiliary: Vec<TrackId>) {
        match self.0.upgrade() {
            Some(shared) => shared.accept_completion(id, primary, auxiliary),
            None => debug!(%id, "coordinator gone, dropping completion"),
        }
    }
}

impl TrackListener for Link {
    fn track_about_to_be_deleted(&self, track: TrackId) {
        if let Some(shared) = self.0.upgrade() {
            shared.forget_track(track);
        }
    }
}

/// Coordinates re-analysis requests, candidates and splicing.
#[derive(Clone)]
pub struct ReAnalysisCoordinator {
    inner: Arc<Shared>,
}

impl ReAnalysisCoordinator {
    pub fn new(engine: Arc<dyn AnalysisEngine>, config: Config) -> Self {
        Self {
            inner: Arc::new(Shared {
                engine,
                config,
                session: Mutex::new(Session::default()),
                events: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Start receiving notifications. Replaces any earlier receiver.
    pub fn subscribe(&self) -> Receiver<CoordinatorEvent> {
        let (tx, rx) = mpsc::channel();
        *self.inner.events.lock().unwrap_or_else(|e| e.into_inner()) = Some(tx);
        rx
    }

    /// Listener to register with the document so candidate tracks deleted
    /// elsewhere are dropped from the candidate list.
    pub fn track_listener(&self) -> Arc<dyn TrackListener> {
        Arc::new(Link(Arc::downgrade(&self.inner)))
    }

    fn handler(&self) -> Arc<dyn CompletionHandler> {
        Arc::new(Link(Arc::downgrade(&self.inner)))
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Work on a newly loaded recording. Any previous state is dropped.
    pub fn attach(&self, context: SessionContext) {
        let superseded = {
            let mut session = self.inner.lock();
            let superseded = session.outstanding;
            *session = Session {
                document: Some(context.document),
                pane: context.pane,
                model: context.model,
                tracks: context.tracks,
                ..Session::default()
            };
            superseded
        };
        if let Some(id) = superseded {
            self.inner.engine.cancel(id);
        }
        info!("attached to document");
    }

    /// Forget everything about the current recording.
    pub fn file_closed(&self) {
        let superseded = {
            let mut session = self.inner.lock();
            let superseded = session.outstanding;
            let pending: Vec<JobId> = session.pending_merges.iter().map(|p| p.id).collect();
            *session = Session::default();
            superseded.into_iter().chain(pending).collect::<Vec<_>>()
        };
        for id in superseded {
            self.inner.engine.cancel(id);
        }
        debug!("file closed");
    }

    /// Re-analyse `sel`, optionally constrained to a frequency band.
    ///
    /// Returns as soon as the batch is submitted. Candidates show up when
    /// the engine delivers, announced by [`CoordinatorEvent::CandidatesChanged`].
    pub fn reanalyse_selection(
        &self,
        sel: Selection,
        range: FrequencyRange,
    ) -> Result<(), CoordinatorError> {
        let mut session = self.inner.lock();
        let ctx = session.context()?;

        if !session.active_selection.is_empty()
            && sel == session.active_selection
            && range == session.active_range
        {
            debug!(%sel, "selection & range are same as current analysis, ignoring");
            return Ok(());
        }

        if sel.is_empty() {
            return Ok(());
        }

        let superseded = session.outstanding.take();
        if superseded.is_some() {
            session.active_selection = Selection::empty();
            session.state = CoordinatorState::Idle;
        }

        let discarded = if session.candidates.is_empty() {
            false
        } else {
            let _op = AtomicOperation::begin(ctx.document.as_ref(), "Discard Previous Candidates");
            session.discard_candidates(ctx.document.as_ref(), ctx.pane)
        };

        let result = self.prepare_candidate_batch(&mut session, &ctx, sel, range);
        drop(session);

        if let Some(id) = superseded {
            debug!(%id, "cancelling superseded request");
            self.inner.engine.cancel(id);
        }
        if discarded {
            self.inner.notify(CoordinatorEvent::CandidatesCleared);
        }

        if let Some(batch) = result? {
            info!(id = %batch.id, %sel, engine = self.inner.engine.name(), "submitting re-analysis");
            self.inner.engine.submit(batch, self.handler());
        }
        Ok(())
    }

    /// Build the candidate batch and record it as outstanding.
    ///
    /// `Ok(None)` means the aligned window is empty and nothing is submitted.
    fn prepare_candidate_batch(
        &self,
        session: &mut Session,
        ctx: &Context,
        sel: Selection,
        range: FrequencyRange,
    ) -> Result<Option<JobBatch>, CoordinatorError> {
        let engine_config = &self.inner.config.engine;
        let transform = if range.is_constrained() {
            &engine_config.constrained_transform
        } else {
            &engine_config.candidates_transform
        };
        self.require(transform)?;

        let window = engine_config.grid.align(sel, range);
        debug!(
            %sel,
            start = window.start,
            end = window.end,
            constrained = range.is_constrained(),
            "aligned analysis window"
        );
        if !window.has_duration(ctx.model.sample_rate) {
            debug!("{}, not analysing", CoordinatorError::ZeroDurationWindow { window });
            return Ok(None);
        }

        let mut parameters = BTreeMap::from([
            ("stepSize".to_string(), engine_config.step_size as f32),
            ("blockSize".to_string(), engine_config.block_size as f32),
        ]);
        if range.is_constrained() {
            parameters.insert("minfreq".to_string(), range.min as f32);
            parameters.insert("maxfreq".to_string(), range.max as f32);
            parameters.insert(
                "blockSize".to_string(),
                engine_config.constrained_block_size as f32,
            );
        }

        let pre_analysis = session
            .pitch_track()
            .and_then(|track| ctx.document.copy_range(track, sel))
            .unwrap_or_default();

        let id = self.inner.next_job_id();
        session.outstanding = Some(id);
        session.active_selection = sel;
        session.active_range = range;
        session.pre_analysis = pre_analysis;
        session.state = CoordinatorState::Requesting;
        session.candidates_visible = false;

        Ok(Some(JobBatch::new(
            id,
            vec![AnalysisJob {
                output: OutputKind::PitchCandidates,
                transform: transform.id.clone(),
                selection: sel,
                range,
                window,
                sample_rate: ctx.model.sample_rate,
                parameters,
            }],
        )))
    }

    fn require(&self, transform: &TransformSpec) -> Result<(), CoordinatorError> {
        if self.inner.engine.has_capability(&transform.id) {
            Ok(())
        } else {
            Err(CoordinatorError::EngineUnavailable {
                transform: transform.id.clone(),
                plugin: transform.plugin.clone(),
            })
        }
    }

    /// Gesture entry point: re-analyse a region and show its candidates.
    ///
    /// Visibility is requested after submission, which resets it, so the
    /// candidates are shown as soon as they are ingested.
    pub fn reanalyse_region(&self, frame0: i64, frame1: i64, freq0: f64, freq1: f64) {
        debug!(frame0, frame1, freq0, freq1, "re-analyse region");
        if let Err(e) = self.reanalyse_selection(
            Selection::new(frame0, frame1),
            FrequencyRange::new(freq0, freq1),
        ) {
            warn!("{}", e);
        }
        self.show_pitch_candidates(true);
    }

    pub fn pitch_candidates_shown(&self) -> bool {
        self.inner.lock().candidates_visible
    }

    /// Show or hide every candidate. Undo-able as one step.
    pub fn show_pitch_candidates(&self, shown: bool) {
        let mut session = self.inner.lock();
        if session.candidates_visible == shown {
            return;
        }
        if session.candidates.is_empty() {
            session.candidates_visible = shown;
        } else {
            let Ok(ctx) = session.context() else {
                return;
            };
            let label = if shown {
                "Show Pitch Candidates"
            } else {
                "Hide Pitch Candidates"
            };
            let _op = AtomicOperation::begin(ctx.document.as_ref(), label);
            session.apply_visibility(ctx.document.as_ref(), ctx.pane, shown);
        }
        drop(session);
        self.inner
            .notify(CoordinatorEvent::CandidateVisibilityChanged { visible: shown });
    }

    pub fn have_higher_pitch_candidate(&self) -> bool {
        self.inner.lock().candidates.has_higher()
    }

    pub fn have_lower_pitch_candidate(&self) -> bool {
        self.inner.lock().candidates.has_lower()
    }

    /// Move to the next candidate and splice it into `sel` of the main
    /// pitch track. The splice is applied even if only one candidate exists.
    pub fn switch_pitch_candidate(&self, sel: Selection, up: bool) {
        let mut session = self.inner.lock();
        if session.candidates.is_empty() {
            return;
        }
        let (Some(document), Some(pitch)) = (session.document.clone(), session.pitch_track())
        else {
            return;
        };
        let Some(candidate) = session.candidates.step(up) else {
            return;
        };
        let Some(clip) = document.copy_range(candidate, sel) else {
            return;
        };
        {
            let _op = AtomicOperation::begin(document.as_ref(), "Switch Pitch Candidate");
            document.delete_range(pitch, sel);
            document.paste_snapshot(pitch, &clip, 0);
        }
        let index = session.candidates.current_index().unwrap_or_default();
        drop(session);

        trace!(%candidate, %sel, events = clip.len(), "spliced candidate");
        self.inner
            .notify(CoordinatorEvent::CandidateSwitched { index, selection: sel });
    }

    /// Re-apply the current splice over the active selection.
    pub fn materialise_reanalysis(&self) {
        let active = self.inner.lock().active_selection;
        if active.is_empty() {
            return;
        }
        self.switch_pitch_candidate(active, true);
    }

    /// Discard the candidates and put back the pitches that were in `sel`
    /// before the request. Runs inside the caller's atomic operation.
    ///
    /// A request still in flight is cancelled.
    pub fn abandon_reanalysis(&self, sel: Selection) {
        let mut session = self.inner.lock();
        let Ok(ctx) = session.context() else {
            return;
        };
        let superseded = session.outstanding.take();
        let discarded = session.discard_candidates(ctx.document.as_ref(), ctx.pane);
        session.state = CoordinatorState::Idle;
        if let Some(pitch) = session.pitch_track() {
            ctx.document.delete_range(pitch, sel);
            ctx.document.paste_snapshot(pitch, &session.pre_analysis, 0);
        }
        drop(session);

        if let Some(id) = superseded {
            debug!(%id, "cancelling abandoned request");
            self.inner.engine.cancel(id);
        }
        if discarded {
            self.inner.notify(CoordinatorEvent::CandidatesCleared);
        }
        self.inner.notify(CoordinatorEvent::MainTrackChanged);
    }

    /// Discard the candidates, keeping the main track as spliced.
    pub fn clear_reanalysis(&self) {
        let mut session = self.inner.lock();
        let superseded = session.outstanding.take();
        let discarded = match session.context() {
            Ok(ctx) => session.discard_candidates(ctx.document.as_ref(), ctx.pane),
            Err(_) => {
                session.candidates.take_all();
                session.active_selection = Selection::empty();
                session.active_range = FrequencyRange::unconstrained();
                session.candidates_visible = false;
                false
            }
        };
        session.state = CoordinatorState::Idle;
        drop(session);

        if let Some(id) = superseded {
            self.inner.engine.cancel(id);
        }
        if discarded {
            self.inner.notify(CoordinatorEvent::CandidatesCleared);
        }
    }

    /// Replace the whole main pitch track with the voiced events of `other`.
    ///
    /// Events without a value or with a value <= 0 are skipped; exported
    /// pitch tracks use 0 Hz for "no pitch".
    pub fn take_pitch_track_from(&self, other: TrackId) {
        let session = self.inner.lock();
        let (Some(document), Some(pitch)) = (session.document.clone(), session.pitch_track())
        else {
            return;
        };
        let (Some(own_extent), Some(other_extent)) =
            (document.track_extent(pitch), document.track_extent(other))
        else {
            return;
        };
        let Some(clip) = document.copy_range(other, other_extent) else {
            return;
        };
        let voiced = clip.filtered(|e| e.value.map(|v| v > 0.0).unwrap_or(false));
        debug!(
            %other,
            kept = voiced.len(),
            excluded = clip.len() - voiced.len(),
            "taking pitch track"
        );
        {
            let _op = AtomicOperation::begin(document.as_ref(), "Take Pitch Track");
            document.delete_range(pitch, own_extent);
            document.paste_snapshot(pitch, &voiced, 0);
        }
        drop(session);
        self.inner.notify(CoordinatorEvent::MainTrackChanged);
    }

    /// Move the pitches in `sel` up or down an octave.
    pub fn shift_octave(&self, sel: Selection, up: bool) {
        let factor = if up { 2.0 } else { 0.5 };
        let session = self.inner.lock();
        let (Some(document), Some(pitch)) = (session.document.clone(), session.pitch_track())
        else {
            return;
        };
        let Some(clip) = document.copy_range(pitch, sel) else {
            return;
        };
        let shifted = clip.mapped(|e| match e.value {
            Some(v) => e.with_value(v * factor),
            None => e.clone(),
        });
        {
            let label = if up { "Octave Up" } else { "Octave Down" };
            let _op = AtomicOperation::begin(document.as_ref(), label);
            document.delete_range(pitch, sel);
            document.paste_snapshot(pitch, &shifted, 0);
        }
        drop(session);
        self.inner.notify(CoordinatorEvent::MainTrackChanged);
    }

    /// Remove the pitches in `sel`.
    pub fn delete_pitches(&self, sel: Selection) {
        let session = self.inner.lock();
        let (Some(document), Some(pitch)) = (session.document.clone(), session.pitch_track())
        else {
            return;
        };
        document.delete_range(pitch, sel);
        drop(session);
        self.inner.notify(CoordinatorEvent::MainTrackChanged);
    }

    /// Analyse the part of a growing recording not analysed yet.
    ///
    /// Starts a little before the previous end so note attacks there are
    /// caught. The results are merged into the main tracks when they
    /// arrive and the temporary result tracks are deleted.
    pub fn analyse_recording_to_end(&self, recorded_frames: i64) -> Result<(), CoordinatorError> {
        let mut session = self.inner.lock();
        let ctx = session.context()?;
        let config = &self.inner.config;

        let start = (session.analysed_frames - config.recording.overlap_frames).max(0);
        let sel = Selection::new(start, recorded_frames);
        if sel.is_empty() {
            return Ok(());
        }

        let engine_config = &config.engine;
        self.require(&engine_config.pitch_transform)?;
        self.require(&engine_config.notes_transform)?;

        session.analysed_frames = recorded_frames;
        let window = AnalysisWindow::new(sel.start_frame(), sel.end_frame());
        if !window.has_duration(ctx.model.sample_rate) {
            debug!("{}, not analysing", CoordinatorError::ZeroDurationWindow { window });
            return Ok(());
        }

        let mut parameters = config.analysis.parameters();
        parameters.insert("stepSize".to_string(), engine_config.step_size as f32);
        parameters.insert("blockSize".to_string(), engine_config.block_size as f32);

        let job = |output, transform: &TransformSpec| AnalysisJob {
            output,
            transform: transform.id.clone(),
            selection: sel,
            range: FrequencyRange::unconstrained(),
            window,
            sample_rate: ctx.model.sample_rate,
            parameters: parameters.clone(),
        };
        let id = self.inner.next_job_id();
        let batch = JobBatch::new(
            id,
            vec![
                job(OutputKind::PitchTrack, &engine_config.pitch_transform),
                job(OutputKind::Notes, &engine_config.notes_transform),
            ],
        );
        session.pending_merges.push(PendingMerge {
            id,
            context_start: start,
            end_frame: recorded_frames,
        });
        drop(session);

        info!(%id, %sel, "analysing recording tail");
        self.inner.engine.submit(batch, self.handler());
        Ok(())
    }

    /// Note boundaries around `frame`, clamped at 0.
    ///
    /// Without a notes track both ends are `frame`.
    pub fn enclosing_selection_scope(&self, frame: i64) -> (i64, i64) {
        let session = self.inner.lock();
        let notes = session
            .notes_track()
            .zip(session.document.clone())
            .and_then(|(track, document)| document.all_events(track));
        let Some(notes) = notes else {
            return (frame, frame);
        };

        let boundaries = notes.iter().flat_map(|n| [n.frame, n.end_frame()]);
        let mut f0 = None;
        let mut f1 = None;
        for b in boundaries {
            if b <= frame && f0.map_or(true, |f| b > f) {
                f0 = Some(b);
            }
            if b >= frame && f1.map_or(true, |f| b < f) {
                f1 = Some(b);
            }
        }
        (f0.unwrap_or(frame).max(0), f1.unwrap_or(frame).max(0))
    }

    /// Completion of the initial pitch and note analyses, in percent.
    pub fn initial_analysis_completion(&self) -> u8 {
        let session = self.inner.lock();
        let Some(document) = session.document.clone() else {
            return 0;
        };
        let pitch = session
            .pitch_track()
            .and_then(|t| document.completion(t))
            .unwrap_or(0);
        match session.notes_track().and_then(|t| document.completion(t)) {
            Some(notes) => pitch.min(notes),
            None => pitch,
        }
    }

    /// React to analysis progress. Once the initial analyses are complete
    /// the main tracks are extended to the end of the audio.
    ///
    /// Returns whether the analyses are complete.
    pub fn analysis_completion_changed(&self) -> bool {
        if self.initial_analysis_completion() < 100 {
            return false;
        }
        let session = self.inner.lock();
        if let (Some(document), Some(model)) = (session.document.clone(), session.model) {
            for track in [session.pitch_track(), session.notes_track()].into_iter().flatten() {
                document.extend_end_frame(track, model.frames);
            }
        }
        drop(session);
        self.inner.notify(CoordinatorEvent::InitialAnalysisCompleted);
        true
    }

    pub fn state(&self) -> CoordinatorState {
        self.inner.lock().state
    }

    pub fn candidates(&self) -> Vec<TrackId> {
        self.inner.lock().candidates.tracks().to_vec()
    }

    pub fn current_candidate(&self) -> Option<usize> {
        self.inner.lock().candidates.current_index()
    }

    pub fn active_selection(&self) -> Selection {
        self.inner.lock().active_selection
    }

    pub fn active_range(&self) -> FrequencyRange {
        self.inner.lock().active_range
    }

    pub fn outstanding_job(&self) -> Option<JobId> {
        self.inner.lock().outstanding
    }

    /// Pitches captured from the main track when the active request began.
    pub fn pre_analysis_snapshot(&self) -> Vec<Event> {
        self.inner.lock().pre_analysis.events().to_vec()
    }

    pub fn analysed_frames(&self) -> i64 {
        self.inner.lock().analysed_frames
    }

    pub fn main_track(&self, component: Component) -> Option<TrackId> {
        self.inner.lock().tracks.get(component)
    }

    pub fn set_main_track(&self, component: Component, track: TrackId) {
        self.inner.lock().tracks.set(component, track);
    }

    pub fn playback(&self, component: Component) -> PlaybackState {
        self.inner.lock().tracks.playback(component)
    }

    /// Change the playback state of a loaded component.
    pub fn update_playback(&self, component: Component, f: impl FnOnce(&mut PlaybackState)) {
        if let Some(state) = self.inner.lock().tracks.playback_mut(component) {
            f(state);
        }
    }
}
