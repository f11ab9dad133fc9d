//! Contract with the external analysis engine.
//!
//! The engine turns a time range plus parameters into time-stamped
//! estimates. It runs on its own threads; the core hands it a [`JobBatch`]
//! and a [`CompletionHandler`] and returns immediately.
//!
//! # Delivery rules
//!
//! - A submitted batch is completed at most once, with one primary track
//!   per job plus any auxiliary tracks the job produced.
//! - [`AnalysisEngine::cancel`] is advisory. A cancelled batch may still be
//!   delivered, possibly with no tracks. Receivers must check the batch id.
//!
//! # Module Structure
//!
//! - [`simulated`] - thread-pool engine backed by a pluggable feature source

pub mod simulated;

pub use simulated::{FeatureSource, SimulatedEngine};

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timeline::{AnalysisWindow, FrequencyRange, Selection};
use crate::track::TrackId;

/// Generation number of a submitted batch. Strictly increasing per
/// coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

/// What a job is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    /// The smoothed main pitch track
    PitchTrack,
    /// Note segmentation
    Notes,
    /// Alternative pitch tracks for a region
    PitchCandidates,
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputKind::PitchTrack => write!(f, "pitch track"),
            OutputKind::Notes => write!(f, "notes"),
            OutputKind::PitchCandidates => write!(f, "pitch candidates"),
        }
    }
}

/// A transform the engine may provide, and the plugin that ships it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformSpec {
    /// Fully qualified transform id, e.g. `vamp:pyin:pyin:notes`
    pub id: String,
    /// Human-readable plugin name for error messages
    pub plugin: String,
}

impl TransformSpec {
    pub fn new(id: impl Into<String>, plugin: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            plugin: plugin.into(),
        }
    }
}

/// Shared, advisory cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One transform run over one window.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisJob {
    pub output: OutputKind,
    /// Transform id to run
    pub transform: String,
    /// Selection the user asked for
    pub selection: Selection,
    /// Frequency constraint, if any
    pub range: FrequencyRange,
    /// Grid-aligned frames actually analysed
    pub window: AnalysisWindow,
    pub sample_rate: u32,
    /// Plugin parameters (step size, block size, thresholds, ...)
    pub parameters: BTreeMap<String, f32>,
}

impl AnalysisJob {
    pub fn start_secs(&self) -> f64 {
        self.window.start_secs(self.sample_rate)
    }

    pub fn duration_secs(&self) -> f64 {
        self.window.duration_secs(self.sample_rate)
    }

    pub fn parameter(&self, name: &str) -> Option<f32> {
        self.parameters.get(name).copied()
    }
}

/// Jobs submitted together and completed together.
#[derive(Debug, Clone)]
pub struct JobBatch {
    pub id: JobId,
    pub jobs: Vec<AnalysisJob>,
    pub cancel: CancelToken,
}

impl JobBatch {
    pub fn new(id: JobId, jobs: Vec<AnalysisJob>) -> Self {
        Self {
            id,
            jobs,
            cancel: CancelToken::new(),
        }
    }
}

/// Receiver of finished batches.
///
/// Called on an engine thread. `primary` holds one track per job in
/// submission order; `auxiliary` holds extra outputs.
pub trait CompletionHandler: Send + Sync {
    fn on_job_complete(&self, id: JobId, primary: Vec<TrackId>, auxiliary: Vec<TrackId>);
}

/// The analysis engine as seen by the core.
pub trait AnalysisEngine: Send + Sync {
    /// Name for logging.
    fn name(&self) -> &str;

    /// Whether the transform is installed.
    fn has_capability(&self, transform: &str) -> bool;

    /// Start a batch. Never blocks on the analysis itself.
    fn submit(&self, batch: JobBatch, handler: Arc<dyn CompletionHandler>);

    /// Ask the engine to stop working on a batch. Fire-and-forget.
    fn cancel(&self, id: JobId);
}

/// Errors constructing an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to start analysis workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
