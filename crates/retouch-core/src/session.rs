//! Superseding execution of pipeline runs.
//!
//! The [`Coordinator`] is the state machine: it hands out run ids and
//! cancellation tokens, and decides whether a finished run may deliver.
//! [`AdjustmentSession`] drives it from the caller's side: it owns the
//! source image, starts one worker thread per request, and pushes
//! completed results onto a channel that the display side drains on its
//! own thread.
//!
//! ```text
//!   recompute(p1) ──→ run 1 ────────────╳ cancelled
//!   recompute(p2) ──────→ run 2 ───────────────→ Delivery
//! ```

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use crate::error::CoreError;
use crate::image::PixelBuffer;
use crate::params::AdjustmentParams;
use crate::pipeline::cancel::CancellationToken;
use crate::pipeline::{NoopObserver, Pipeline, PipelineConfig, RunId, StageObserver};

/// Lifecycle of the most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run has been started yet.
    Idle,
    /// A run is in flight.
    Running,
    /// The last run delivered its result.
    Completed,
    /// The last run was cancelled before it could deliver.
    Cancelled,
}

struct ActiveRun {
    id: RunId,
    token: CancellationToken,
}

struct CoordinatorState {
    last_id: RunId,
    active: Option<ActiveRun>,
    state: RunState,
    delivered: u64,
}

/// Tracks the single active run and arbitrates delivery.
///
/// `begin` and `complete` serialize on one lock, so once a newer run has
/// begun, no older run can deliver.
pub struct Coordinator {
    inner: Mutex<CoordinatorState>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CoordinatorState {
                last_id: 0,
                active: None,
                state: RunState::Idle,
                delivered: 0,
            }),
        }
    }

    /// Start a new run, cancelling the one in flight.
    pub fn begin(&self) -> (RunId, CancellationToken) {
        let mut inner = self.inner.lock();

        if let Some(previous) = inner.active.take() {
            previous.token.cancel();
            tracing::debug!(run = previous.id, "run superseded");
        }

        inner.last_id += 1;
        let id = inner.last_id;
        let token = CancellationToken::new();
        inner.active = Some(ActiveRun {
            id,
            token: token.clone(),
        });
        inner.state = RunState::Running;

        tracing::debug!(run = id, "run started");
        (id, token)
    }

    /// Cancel the run in flight, if any. Returns its id.
    pub fn cancel_active(&self) -> Option<RunId> {
        let mut inner = self.inner.lock();
        let previous = inner.active.take()?;
        previous.token.cancel();
        inner.state = RunState::Cancelled;
        tracing::debug!(run = previous.id, "run cancelled");
        Some(previous.id)
    }

    /// Deliver the result of `run` through `deliver` if it is still the
    /// active, uncancelled run. Returns whether delivery happened.
    pub fn complete<F>(&self, run: RunId, deliver: F) -> bool
    where
        F: FnOnce(),
    {
        let mut inner = self.inner.lock();

        let is_current = matches!(
            &inner.active,
            Some(active) if active.id == run && !active.token.is_cancelled()
        );
        if !is_current {
            return false;
        }

        deliver();
        inner.active = None;
        inner.state = RunState::Completed;
        inner.delivered += 1;
        true
    }

    /// Record that `run` stopped at a checkpoint without delivering.
    pub fn abandon(&self, run: RunId) {
        let mut inner = self.inner.lock();
        if matches!(&inner.active, Some(active) if active.id == run) {
            inner.active = None;
            inner.state = RunState::Cancelled;
        }
    }

    pub fn state(&self) -> RunState {
        self.inner.lock().state
    }

    /// Id of the run in flight.
    pub fn active_run(&self) -> Option<RunId> {
        self.inner.lock().active.as_ref().map(|active| active.id)
    }

    /// Number of runs that have delivered so far.
    pub fn delivered_count(&self) -> u64 {
        self.inner.lock().delivered
    }
}

/// A completed run's result, handed to the display side.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub run: RunId,
    pub image: PixelBuffer,
    /// Parameters as applied (after clamping).
    pub params: AdjustmentParams,
    pub average_brightness: u8,
    /// Wall time from worker start to delivery.
    pub elapsed: Duration,
}

/// Receiving end for [`Delivery`] values.
pub type DeliveryReceiver = mpsc::UnboundedReceiver<Delivery>;

/// Everything a worker thread needs for one run.
struct Job {
    run: RunId,
    token: CancellationToken,
    source: Arc<PixelBuffer>,
    params: AdjustmentParams,
    pipeline: Arc<Pipeline>,
    coordinator: Arc<Coordinator>,
    observer: Arc<dyn StageObserver>,
    results: mpsc::UnboundedSender<Delivery>,
}

/// One editing session: a source image plus a stream of adjustment requests.
pub struct AdjustmentSession {
    pipeline: Arc<Pipeline>,
    coordinator: Arc<Coordinator>,
    observer: Arc<dyn StageObserver>,
    source: RwLock<Option<Arc<PixelBuffer>>>,
    results: mpsc::UnboundedSender<Delivery>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl AdjustmentSession {
    /// Create a session and the receiver its results arrive on.
    pub fn new(config: PipelineConfig) -> (Self, DeliveryReceiver) {
        Self::with_observer(config, Arc::new(NoopObserver))
    }

    /// Like [`Self::new`], reporting stage progress to `observer`.
    pub fn with_observer(
        config: PipelineConfig,
        observer: Arc<dyn StageObserver>,
    ) -> (Self, DeliveryReceiver) {
        let (results, receiver) = mpsc::unbounded_channel();
        let session = Self {
            pipeline: Arc::new(Pipeline::new(config)),
            coordinator: Arc::new(Coordinator::new()),
            observer,
            source: RwLock::new(None),
            results,
            workers: Mutex::new(Vec::new()),
        };
        (session, receiver)
    }

    /// Replace the source image.
    ///
    /// A run in flight was computed against the old image, so it is
    /// cancelled. Later requests use the new one.
    pub fn set_source(&self, image: PixelBuffer) {
        let mut source = self.source.write();
        tracing::info!(
            width = image.width(),
            height = image.height(),
            "source image replaced"
        );
        *source = Some(Arc::new(image));
        self.coordinator.cancel_active();
    }

    pub fn source(&self) -> Option<Arc<PixelBuffer>> {
        self.source.read().clone()
    }

    /// Start a run for `params`, superseding any run in flight.
    pub fn recompute(&self, params: AdjustmentParams) -> Result<RunId, CoreError> {
        // Hold the read lock across `begin` so `set_source` cannot slip in
        // between picking the image and registering the run.
        let source_guard = self.source.read();
        let source = source_guard.clone().ok_or(CoreError::NoSource)?;
        let (run, token) = self.coordinator.begin();
        drop(source_guard);

        let job = Job {
            run,
            token,
            source,
            params,
            pipeline: Arc::clone(&self.pipeline),
            coordinator: Arc::clone(&self.coordinator),
            observer: Arc::clone(&self.observer),
            results: self.results.clone(),
        };

        let handle = std::thread::Builder::new()
            .name(format!("retouch-run-{run}"))
            .spawn(move || run_job(job))
            .map_err(|e| {
                self.coordinator.abandon(run);
                CoreError::Spawn(e)
            })?;

        let mut workers = self.workers.lock();
        workers.retain(|worker| !worker.is_finished());
        workers.push(handle);

        Ok(run)
    }

    /// Cancel the run in flight without starting another.
    pub fn cancel(&self) -> Option<RunId> {
        self.coordinator.cancel_active()
    }

    pub fn state(&self) -> RunState {
        self.coordinator.state()
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Block until every worker started so far has exited.
    pub fn wait_idle(&self) {
        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("pipeline worker panicked");
            }
        }
    }
}

impl Drop for AdjustmentSession {
    fn drop(&mut self) {
        self.coordinator.cancel_active();
    }
}

fn run_job(job: Job) {
    let started = Instant::now();
    let Job {
        run,
        token,
        source,
        params,
        pipeline,
        coordinator,
        observer,
        results,
    } = job;

    let output =
        match pipeline.recompute_observed(&source, &params, &token, run, observer.as_ref()) {
            Ok(output) => output,
            Err(_) => {
                coordinator.abandon(run);
                tracing::debug!(run, "run stopped at checkpoint");
                return;
            }
        };

    let elapsed = started.elapsed();
    let delivery = Delivery {
        run,
        image: output.image,
        params: output.params,
        average_brightness: output.average_brightness,
        elapsed,
    };

    let delivered = coordinator.complete(run, || {
        if results.send(delivery).is_err() {
            tracing::debug!(run, "result receiver dropped");
        }
    });

    if delivered {
        tracing::info!(
            run,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "run delivered"
        );
    } else {
        tracing::debug!(run, "run finished after being superseded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_coordinator_is_idle() {
        let coordinator = Coordinator::new();
        assert_eq!(coordinator.state(), RunState::Idle);
        assert_eq!(coordinator.active_run(), None);
    }

    #[test]
    fn test_begin_cancels_previous_token() {
        let coordinator = Coordinator::new();
        let (a, token_a) = coordinator.begin();
        let (b, token_b) = coordinator.begin();
        assert!(b > a);
        assert!(token_a.is_cancelled());
        assert!(!token_b.is_cancelled());
        assert_eq!(coordinator.active_run(), Some(b));
        assert_eq!(coordinator.state(), RunState::Running);
    }

    #[test]
    fn test_superseded_run_never_delivers() {
        let coordinator = Coordinator::new();
        let (a, _) = coordinator.begin();
        let (b, _) = coordinator.begin();

        let mut delivered = Vec::new();
        assert!(!coordinator.complete(a, || delivered.push(a)));
        assert!(coordinator.complete(b, || delivered.push(b)));

        assert_eq!(delivered, vec![b]);
        assert_eq!(coordinator.delivered_count(), 1);
        assert_eq!(coordinator.state(), RunState::Completed);
    }

    #[test]
    fn test_late_finish_of_old_run_after_new_completes() {
        let coordinator = Coordinator::new();
        let (a, _) = coordinator.begin();
        let (b, _) = coordinator.begin();
        assert!(coordinator.complete(b, || {}));
        assert!(!coordinator.complete(a, || {}));
        assert_eq!(coordinator.delivered_count(), 1);
    }

    #[test]
    fn test_sequential_runs_each_deliver() {
        let coordinator = Coordinator::new();
        let (a, _) = coordinator.begin();
        assert!(coordinator.complete(a, || {}));
        let (b, _) = coordinator.begin();
        assert!(coordinator.complete(b, || {}));
        assert_eq!(coordinator.delivered_count(), 2);
    }

    #[test]
    fn test_cancel_active_blocks_delivery() {
        let coordinator = Coordinator::new();
        let (a, token) = coordinator.begin();
        assert_eq!(coordinator.cancel_active(), Some(a));
        assert!(token.is_cancelled());
        assert!(!coordinator.complete(a, || {}));
        assert_eq!(coordinator.state(), RunState::Cancelled);
        assert_eq!(coordinator.cancel_active(), None);
    }

    #[test]
    fn test_abandon_only_affects_matching_run() {
        let coordinator = Coordinator::new();
        let (a, _) = coordinator.begin();
        let (b, _) = coordinator.begin();
        coordinator.abandon(a);
        assert_eq!(coordinator.active_run(), Some(b));
        coordinator.abandon(b);
        assert_eq!(coordinator.active_run(), None);
        assert_eq!(coordinator.state(), RunState::Cancelled);
    }

    #[test]
    fn test_recompute_without_source_fails() {
        let (session, _rx) = AdjustmentSession::new(PipelineConfig::default());
        let err = session.recompute(AdjustmentParams::default()).unwrap_err();
        assert!(matches!(err, CoreError::NoSource));
        assert_eq!(session.state(), RunState::Idle);
    }
}
