//! Thread-pool analysis engine with a pluggable feature source.
//!
//! Batches run on a dedicated Rayon pool. Each job asks the
//! [`FeatureSource`] for its output tracks, which are created in the
//! [`MemoryDocument`] before the completion handler is called, the same way
//! a plugin host materialises derived tracks.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tracing::{debug, info};

use super::{
    AnalysisEngine, AnalysisJob, CancelToken, CompletionHandler, EngineError, JobBatch, JobId,
    OutputKind,
};
use crate::document::MemoryDocument;
use crate::track::{Event, TrackId, TrackKind};

/// Default number of worker threads
pub const DEFAULT_WORKERS: usize = 2;

/// Produces the output tracks of one job.
///
/// The first returned sequence is the job's primary output; any further
/// sequences are auxiliary outputs.
pub trait FeatureSource: Send + Sync {
    fn extract(&self, job: &AnalysisJob) -> Vec<Vec<Event>>;
}

impl<F> FeatureSource for F
where
    F: Fn(&AnalysisJob) -> Vec<Vec<Event>> + Send + Sync,
{
    fn extract(&self, job: &AnalysisJob) -> Vec<Vec<Event>> {
        self(job)
    }
}

/// Counts batches that have been submitted but not yet delivered.
#[derive(Default)]
struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
}

impl InFlight {
    fn start(&self) {
        *self.count.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }

    fn finish(&self) {
        let mut count = self.count.lock().unwrap_or_else(|e| e.into_inner());
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn wait_idle(&self, timeout: Duration) -> bool {
        let count = self.count.lock().unwrap_or_else(|e| e.into_inner());
        let (count, _) = self
            .idle
            .wait_timeout_while(count, timeout, |c| *c > 0)
            .unwrap_or_else(|e| e.into_inner());
        *count == 0
    }
}

/// Analysis engine running jobs on a background pool.
pub struct SimulatedEngine {
    document: Arc<MemoryDocument>,
    source: Arc<dyn FeatureSource>,
    capabilities: HashSet<String>,
    pool: rayon::ThreadPool,
    latency: Duration,
    in_flight: Arc<InFlight>,
    tokens: Arc<Mutex<HashMap<JobId, CancelToken>>>,
}

impl SimulatedEngine {
    /// Create an engine providing the given transforms.
    pub fn new<I, S>(
        document: Arc<MemoryDocument>,
        source: Arc<dyn FeatureSource>,
        capabilities: I,
        workers: usize,
    ) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("engine-{}", i))
            .build()?;

        Ok(Self {
            document,
            source,
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            pool,
            latency: Duration::ZERO,
            in_flight: Arc::new(InFlight::default()),
            tokens: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Delay every batch by `latency` before extracting features.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Block until every submitted batch has been delivered.
    ///
    /// Returns false if `timeout` elapsed first.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.in_flight.wait_idle(timeout)
    }

    fn track_kind(output: OutputKind) -> TrackKind {
        match output {
            OutputKind::Notes => TrackKind::Notes,
            OutputKind::PitchTrack | OutputKind::PitchCandidates => TrackKind::Pitch,
        }
    }
}

impl AnalysisEngine for SimulatedEngine {
    fn name(&self) -> &str {
        "simulated"
    }

    fn has_capability(&self, transform: &str) -> bool {
        self.capabilities.contains(transform)
    }

    fn submit(&self, batch: JobBatch, handler: Arc<dyn CompletionHandler>) {
        info!(id = %batch.id, jobs = batch.jobs.len(), "engine accepted batch");

        self.tokens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(batch.id, batch.cancel.clone());
        self.in_flight.start();

        let document = Arc::clone(&self.document);
        let source = Arc::clone(&self.source);
        let in_flight = Arc::clone(&self.in_flight);
        let tokens = Arc::clone(&self.tokens);
        let latency = self.latency;

        self.pool.spawn(move || {
            if !latency.is_zero() {
                std::thread::sleep(latency);
            }

            let mut primary = Vec::new();
            let mut auxiliary = Vec::new();

            for job in &batch.jobs {
                if batch.cancel.is_cancelled() {
                    debug!(id = %batch.id, "batch cancelled, delivering partial results");
                    break;
                }
                let kind = Self::track_kind(job.output);
                let mut outputs = source.extract(job).into_iter();
                if let Some(first) = outputs.next() {
                    primary.push(document.create_track(kind, first));
                }
                auxiliary.extend(outputs.map(|events| document.create_track(kind, events)));
            }

            tokens
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&batch.id);

            handler.on_job_complete(batch.id, primary, auxiliary);
            in_flight.finish();
        });
    }

    fn cancel(&self, id: JobId) {
        if let Some(token) = self
            .tokens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
        {
            debug!(%id, "cancel requested");
            token.cancel();
        }
    }
}

/// Collects delivered batches; handy for tests and tooling.
#[derive(Default)]
pub struct CollectingHandler {
    delivered: Mutex<Vec<(JobId, Vec<TrackId>, Vec<TrackId>)>>,
}

impl CollectingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<(JobId, Vec<TrackId>, Vec<TrackId>)> {
        self.delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl CompletionHandler for CollectingHandler {
    fn on_job_complete(&self, id: JobId, primary: Vec<TrackId>, auxiliary: Vec<TrackId>) {
        self.delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, primary, auxiliary));
    }
}
