//! In-memory document with a compound-operation journal.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, trace};

use super::{Document, PaneId, TrackStyle};
use crate::timeline::Selection;
use crate::track::{Event, EventSnapshot, EventStore, TrackId, TrackKind};

/// Receives notice of tracks being disposed of.
pub trait TrackListener: Send + Sync {
    fn track_about_to_be_deleted(&self, track: TrackId);
}

#[derive(Debug, Clone)]
struct TrackRecord {
    kind: TrackKind,
    store: EventStore,
    pane: Option<PaneId>,
    visible: bool,
    style: TrackStyle,
    completion: u8,
}

/// One reversible mutation.
#[derive(Debug, Clone)]
enum Command {
    Deleted { track: TrackId, events: Vec<Event> },
    Added { track: TrackId, events: Vec<Event> },
    ShownInView { track: TrackId },
    RemovedFromView { track: TrackId, pane: PaneId },
    VisibilityChanged { track: TrackId, previous: bool },
}

impl Command {
    fn track(&self) -> TrackId {
        match self {
            Command::Deleted { track, .. }
            | Command::Added { track, .. }
            | Command::ShownInView { track }
            | Command::RemovedFromView { track, .. }
            | Command::VisibilityChanged { track, .. } => *track,
        }
    }
}

#[derive(Debug, Clone)]
struct Transaction {
    label: String,
    commands: Vec<Command>,
}

/// Default number of undo steps kept
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug)]
struct Journal {
    open: Option<Transaction>,
    depth: usize,
    history: Vec<Transaction>,
    limit: usize,
    /// Tracks whose removal from view dropped out of the history
    expired: Vec<TrackId>,
}

impl Default for Journal {
    fn default() -> Self {
        Self {
            open: None,
            depth: 0,
            history: Vec::new(),
            limit: DEFAULT_HISTORY_LIMIT,
            expired: Vec::new(),
        }
    }
}

impl Journal {
    fn record(&mut self, label: &str, command: Command) {
        match self.open.as_mut() {
            Some(tx) => tx.commands.push(command),
            None => self.push(Transaction {
                label: label.to_string(),
                commands: vec![command],
            }),
        }
    }

    /// Append a finished step, dropping the oldest beyond the limit.
    fn push(&mut self, tx: Transaction) {
        self.history.push(tx);
        let excess = self.history.len().saturating_sub(self.limit);
        for old in self.history.drain(..excess) {
            self.expired
                .extend(old.commands.iter().filter_map(|command| match command {
                    Command::RemovedFromView { track, .. } => Some(*track),
                    _ => None,
                }));
        }
    }

    fn references(&self, track: TrackId) -> bool {
        self.history
            .iter()
            .chain(self.open.as_ref())
            .flat_map(|tx| tx.commands.iter())
            .any(|command| command.track() == track)
    }
}

#[derive(Debug, Default)]
struct DocState {
    next_id: u64,
    tracks: BTreeMap<TrackId, TrackRecord>,
    journal: Journal,
}

impl DocState {
    fn track(&self, id: TrackId) -> Option<&TrackRecord> {
        self.tracks.get(&id)
    }

    fn track_mut(&mut self, id: TrackId) -> Option<&mut TrackRecord> {
        self.tracks.get_mut(&id)
    }

    fn revert(&mut self, command: Command) {
        match command {
            Command::Deleted { track, events } => {
                if let Some(record) = self.track_mut(track) {
                    for event in events {
                        record.store.add(event);
                    }
                }
            }
            Command::Added { track, events } => {
                if let Some(record) = self.track_mut(track) {
                    for event in &events {
                        record.store.remove(event);
                    }
                }
            }
            Command::ShownInView { track } => {
                if let Some(record) = self.track_mut(track) {
                    record.pane = None;
                }
            }
            Command::RemovedFromView { track, pane } => {
                if let Some(record) = self.track_mut(track) {
                    record.pane = Some(pane);
                }
            }
            Command::VisibilityChanged { track, previous } => {
                if let Some(record) = self.track_mut(track) {
                    record.visible = previous;
                }
            }
        }
    }
}

/// Thread-safe in-memory [`Document`].
///
/// Every mutation goes into a journal. Mutations made while an atomic
/// operation is open are grouped under its label and undone together by
/// [`MemoryDocument::undo`].
///
/// The journal keeps at most [`DEFAULT_HISTORY_LIMIT`] steps unless
/// configured otherwise. Tracks removed from view are disposed of by
/// [`MemoryDocument::release_expired`] once their removal has dropped out
/// of the history. Release notifies listeners, so it is left to the owner
/// to call it at a point where no listener holds its own lock.
#[derive(Default)]
pub struct MemoryDocument {
    state: Mutex<DocState>,
    listeners: Mutex<Vec<Arc<dyn TrackListener>>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` undo steps.
    pub fn with_history_limit(limit: usize) -> Self {
        let doc = Self::default();
        doc.lock().journal.limit = limit;
        doc
    }

    fn lock(&self) -> MutexGuard<'_, DocState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a listener for track disposal.
    pub fn add_listener(&self, listener: Arc<dyn TrackListener>) {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(listener);
    }

    /// Create a fully analysed track holding `events`. Not journaled.
    pub fn create_track(&self, kind: TrackKind, events: Vec<Event>) -> TrackId {
        let mut state = self.lock();
        state.next_id += 1;
        let id = TrackId(state.next_id);
        state.tracks.insert(
            id,
            TrackRecord {
                kind,
                store: EventStore::from_events(events),
                pane: None,
                visible: true,
                style: TrackStyle::default(),
                completion: 100,
            },
        );
        trace!(%id, ?kind, "created track");
        id
    }

    /// Set the analysis completion reported for a track.
    pub fn set_completion(&self, track: TrackId, percent: u8) -> bool {
        match self.lock().track_mut(track) {
            Some(record) => {
                record.completion = percent.min(100);
                true
            }
            None => false,
        }
    }

    pub fn contains_track(&self, track: TrackId) -> bool {
        self.lock().track(track).is_some()
    }

    /// Tracks currently shown in a pane, in id order.
    pub fn tracks_in_view(&self, pane: PaneId) -> Vec<TrackId> {
        self.lock()
            .tracks
            .iter()
            .filter(|(_, r)| r.pane == Some(pane))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn is_in_view(&self, track: TrackId) -> bool {
        self.lock()
            .track(track)
            .map(|r| r.pane.is_some())
            .unwrap_or(false)
    }

    pub fn is_visible(&self, track: TrackId) -> Option<bool> {
        self.lock().track(track).map(|r| r.visible)
    }

    pub fn style(&self, track: TrackId) -> Option<TrackStyle> {
        self.lock().track(track).map(|r| r.style.clone())
    }

    /// Labels of the undo-able steps, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.lock()
            .journal
            .history
            .iter()
            .map(|tx| tx.label.clone())
            .collect()
    }

    /// Whether an atomic operation is currently open.
    pub fn in_atomic_operation(&self) -> bool {
        self.lock().journal.open.is_some()
    }

    /// Dispose of removed tracks that can no longer be brought back.
    ///
    /// Returns the released tracks.
    pub fn release_expired(&self) -> Vec<TrackId> {
        let doomed: Vec<TrackId> = {
            let mut state = self.lock();
            let mut expired = std::mem::take(&mut state.journal.expired);
            expired.sort_unstable();
            expired.dedup();
            // Tracks back in view or already gone are dropped; tracks still
            // named by an undo step wait until that step expires too
            let (doomed, pending): (Vec<TrackId>, Vec<TrackId>) = expired
                .into_iter()
                .filter(|track| state.track(*track).map_or(false, |r| r.pane.is_none()))
                .partition(|track| !state.journal.references(*track));
            state.journal.expired = pending;
            doomed
        };
        for track in &doomed {
            debug!(%track, "releasing removed track");
            self.delete_track(*track);
        }
        doomed
    }

    /// Undo the most recent step. Returns its label.
    pub fn undo(&self) -> Option<String> {
        let mut state = self.lock();
        if state.journal.open.is_some() {
            return None;
        }
        let tx = state.journal.history.pop()?;
        for command in tx.commands.into_iter().rev() {
            state.revert(command);
        }
        debug!(label = %tx.label, "undid operation");
        Some(tx.label)
    }
}

impl Document for MemoryDocument {
    fn track_kind(&self, track: TrackId) -> Option<TrackKind> {
        self.lock().track(track).map(|r| r.kind)
    }

    fn track_extent(&self, track: TrackId) -> Option<Selection> {
        self.lock().track(track).map(|r| r.store.extent())
    }

    fn completion(&self, track: TrackId) -> Option<u8> {
        self.lock().track(track).map(|r| r.completion)
    }

    fn copy_range(&self, track: TrackId, sel: Selection) -> Option<EventSnapshot> {
        self.lock().track(track).map(|r| r.store.copy_range(sel))
    }

    fn all_events(&self, track: TrackId) -> Option<Vec<Event>> {
        self.lock().track(track).map(|r| r.store.all().to_vec())
    }

    fn delete_range(&self, track: TrackId, sel: Selection) -> bool {
        let mut state = self.lock();
        let Some(record) = state.track_mut(track) else {
            return false;
        };
        let events = record.store.delete_range(sel);
        if !events.is_empty() {
            trace!(%track, %sel, count = events.len(), "deleted range");
            state
                .journal
                .record("Delete Selection", Command::Deleted { track, events });
        }
        true
    }

    fn paste_snapshot(&self, track: TrackId, snapshot: &EventSnapshot, offset: i64) -> bool {
        let mut state = self.lock();
        let Some(record) = state.track_mut(track) else {
            return false;
        };
        let events = record.store.paste(snapshot, offset);
        if !events.is_empty() {
            trace!(%track, count = events.len(), offset, "pasted snapshot");
            state.journal.record("Paste", Command::Added { track, events });
        }
        true
    }

    fn add_events(&self, track: TrackId, events: &[Event]) -> bool {
        let mut state = self.lock();
        let Some(record) = state.track_mut(track) else {
            return false;
        };
        for event in events {
            record.store.add(event.clone());
        }
        if !events.is_empty() {
            state.journal.record(
                "Add Events",
                Command::Added {
                    track,
                    events: events.to_vec(),
                },
            );
        }
        true
    }

    fn remove_event(&self, track: TrackId, event: &Event) -> bool {
        let mut state = self.lock();
        let Some(record) = state.track_mut(track) else {
            return false;
        };
        if !record.store.remove(event) {
            return false;
        }
        state.journal.record(
            "Remove Event",
            Command::Deleted {
                track,
                events: vec![event.clone()],
            },
        );
        true
    }

    fn extend_end_frame(&self, track: TrackId, frame: i64) -> bool {
        match self.lock().track_mut(track) {
            Some(record) => {
                record.store.extend_end_frame(frame);
                true
            }
            None => false,
        }
    }

    fn add_track_to_view(&self, pane: PaneId, track: TrackId) -> bool {
        let mut state = self.lock();
        let Some(record) = state.track_mut(track) else {
            return false;
        };
        if record.pane == Some(pane) {
            return true;
        }
        record.pane = Some(pane);
        state
            .journal
            .record("Add Layer", Command::ShownInView { track });
        true
    }

    fn remove_track(&self, pane: PaneId, track: TrackId) -> bool {
        let mut state = self.lock();
        let Some(record) = state.track_mut(track) else {
            return false;
        };
        if record.pane != Some(pane) {
            return false;
        }
        record.pane = None;
        state
            .journal
            .record("Remove Layer", Command::RemovedFromView { track, pane });
        true
    }

    fn delete_track(&self, track: TrackId) {
        if !self.contains_track(track) {
            return;
        }

        // Listeners may call back into the document, so no lock is held here.
        let listeners: Vec<Arc<dyn TrackListener>> = self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for listener in &listeners {
            listener.track_about_to_be_deleted(track);
        }

        let mut state = self.lock();
        state.tracks.remove(&track);
        debug!(%track, "deleted track");
    }

    fn set_track_visible(&self, pane: PaneId, track: TrackId, visible: bool) -> bool {
        let mut state = self.lock();
        let Some(record) = state.track_mut(track) else {
            return false;
        };
        if record.pane != Some(pane) {
            return false;
        }
        let previous = record.visible;
        record.visible = visible;
        let label = if visible { "Show Layer" } else { "Hide Layer" };
        state
            .journal
            .record(label, Command::VisibilityChanged { track, previous });
        true
    }

    fn set_track_style(&self, track: TrackId, style: &TrackStyle) -> bool {
        match self.lock().track_mut(track) {
            Some(record) => {
                record.style = style.clone();
                true
            }
            None => false,
        }
    }

    fn begin_atomic_operation(&self, label: &str) {
        let mut state = self.lock();
        let journal = &mut state.journal;
        if journal.open.is_none() {
            journal.open = Some(Transaction {
                label: label.to_string(),
                commands: Vec::new(),
            });
        }
        journal.depth += 1;
    }

    fn end_atomic_operation(&self) {
        let mut state = self.lock();
        let journal = &mut state.journal;
        if journal.depth == 0 {
            return;
        }
        journal.depth -= 1;
        if journal.depth == 0 {
            if let Some(tx) = journal.open.take() {
                // Empty compound operations leave nothing to undo.
                if !tx.commands.is_empty() {
                    journal.push(tx);
                }
            }
        }
    }
}
