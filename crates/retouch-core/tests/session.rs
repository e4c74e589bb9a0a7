//! Threaded session tests: superseding, source replacement, delivery.
//!
//! Run with: `cargo test -p retouch-core`

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use parking_lot::Mutex;
use retouch_core::{
    AdjustmentParams, AdjustmentSession, PixelBuffer, Pipeline, PipelineConfig, RunId, RunState,
    Stage, StageObserver, CancellationToken,
};

const TIMEOUT: Duration = Duration::from_secs(10);

/// Parks one run right after its brightness stage until released.
struct Gate {
    blocked_run: RunId,
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

struct GateHandles {
    entered: Receiver<()>,
    release: Sender<()>,
}

fn gate(blocked_run: RunId) -> (Arc<Gate>, GateHandles) {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let gate = Arc::new(Gate {
        blocked_run,
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    });
    (
        gate,
        GateHandles {
            entered: entered_rx,
            release: release_tx,
        },
    )
}

impl StageObserver for Gate {
    fn stage_completed(&self, run: RunId, stage: Stage) {
        if run == self.blocked_run && stage == Stage::Brightness {
            let _ = self.entered.lock().send(());
            let _ = self.release.lock().recv_timeout(TIMEOUT);
        }
    }
}

fn expected(source: &PixelBuffer, params: &AdjustmentParams) -> PixelBuffer {
    Pipeline::default()
        .recompute(source, params, &CancellationToken::new())
        .expect("uncancelled run")
        .image
}

#[test]
fn test_newer_request_supersedes_stalled_run() {
    let (observer, handles) = gate(1);
    let (session, mut rx) = AdjustmentSession::with_observer(PipelineConfig::default(), observer);
    let source = PixelBuffer::test_pattern(200, 100);
    session.set_source(source.clone());

    let params_a = AdjustmentParams::new(40.0, 0.0, 0.0, 1.0);
    let params_b = AdjustmentParams::new(-30.0, 60.0, 20.0, 1.4);

    let run_a = session.recompute(params_a).unwrap();
    handles
        .entered
        .recv_timeout(TIMEOUT)
        .expect("run A should reach the gate");

    let run_b = session.recompute(params_b).unwrap();
    assert!(run_b > run_a);

    let delivery = rx.blocking_recv().expect("run B should deliver");
    assert_eq!(delivery.run, run_b);
    assert_eq!(delivery.image, expected(&source, &params_b));

    handles.release.send(()).unwrap();
    session.wait_idle();

    assert!(rx.try_recv().is_err(), "run A must never deliver");
    assert_eq!(session.coordinator().delivered_count(), 1);
    assert_eq!(session.state(), RunState::Completed);
}

#[test]
fn test_replacing_source_cancels_in_flight_run() {
    let (observer, handles) = gate(1);
    let (session, mut rx) = AdjustmentSession::with_observer(PipelineConfig::default(), observer);
    session.set_source(PixelBuffer::test_pattern(200, 100));

    session
        .recompute(AdjustmentParams::new(10.0, 10.0, 10.0, 1.0))
        .unwrap();
    handles.entered.recv_timeout(TIMEOUT).unwrap();

    session.set_source(PixelBuffer::filled(3, 5, [10, 20, 30]));
    handles.release.send(()).unwrap();
    session.wait_idle();

    assert!(rx.try_recv().is_err());
    assert_eq!(session.state(), RunState::Cancelled);

    let run = session.recompute(AdjustmentParams::default()).unwrap();
    let delivery = rx.blocking_recv().unwrap();
    assert_eq!(delivery.run, run);
    assert_eq!(delivery.image.dimensions(), (3, 5));
    assert_eq!(delivery.image, PixelBuffer::filled(3, 5, [10, 20, 30]));
}

#[test]
fn test_explicit_cancel_suppresses_delivery() {
    let (observer, handles) = gate(1);
    let (session, mut rx) = AdjustmentSession::with_observer(PipelineConfig::default(), observer);
    session.set_source(PixelBuffer::test_pattern(50, 50));

    let run = session.recompute(AdjustmentParams::default()).unwrap();
    handles.entered.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(session.cancel(), Some(run));

    handles.release.send(()).unwrap();
    session.wait_idle();

    assert!(rx.try_recv().is_err());
    assert_eq!(session.coordinator().delivered_count(), 0);
}

#[test]
fn test_burst_delivers_last_request() {
    let (session, mut rx) = AdjustmentSession::new(PipelineConfig::default());
    let source = PixelBuffer::test_pattern(400, 300);
    session.set_source(source.clone());

    let target = AdjustmentParams::new(25.0, 40.0, -30.0, 1.8);
    let mut last = 0;
    for step in 1..=10 {
        let params = AdjustmentParams::default().lerp(&target, step as f32 / 10.0);
        last = session.recompute(params).unwrap();
    }
    session.wait_idle();

    let mut deliveries = Vec::new();
    while let Ok(delivery) = rx.try_recv() {
        deliveries.push(delivery);
    }

    // Earlier runs may have finished before the next request arrived, but
    // the newest run always delivers and always last.
    let newest = deliveries.last().expect("at least one delivery");
    assert_eq!(newest.run, last);
    assert_eq!(newest.image, expected(&source, &target));
    assert!(deliveries.windows(2).all(|w| w[0].run < w[1].run));
}

#[test]
fn test_source_is_shared_not_copied_into_session_state() {
    let (session, _rx) = AdjustmentSession::new(PipelineConfig::default());
    assert!(session.source().is_none());
    session.set_source(PixelBuffer::filled(2, 2, [1, 2, 3]));
    let a = session.source().unwrap();
    let b = session.source().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}
