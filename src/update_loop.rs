//! Fixed-cadence update loop
//!
//! One worker thread per active screen. Each iteration sleeps for the
//! cadence, hands a snapshot to the renderer, then integrates one step.
//! The sleep is a `recv_timeout` on a stop channel, so [`UpdateLoop::stop`]
//! wakes the worker immediately. A stopped loop cannot be restarted; build
//! a new one on the next activation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::clock::Clock;
use crate::error::Result;

/// Shared state the loop can advance and snapshot
pub trait Simulation: Send + Sync + 'static {
    type Snapshot: Send;

    /// Atomic copy of what the renderer needs
    fn snapshot(&self) -> Self::Snapshot;

    /// Advance to `now_ms`
    fn integrate(&self, now_ms: u64);
}

/// Draws snapshots. Never touches the simulation state directly.
pub trait Renderer<S>: Send + 'static {
    fn draw(&mut self, snapshot: &S);
}

impl<S, F> Renderer<S> for F
where
    F: FnMut(&S) + Send + 'static,
{
    fn draw(&mut self, snapshot: &S) {
        self(snapshot)
    }
}

pub struct UpdateLoop {
    running: Arc<AtomicBool>,
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl UpdateLoop {
    /// Spawn the worker
    pub fn start<S, R>(
        sim: Arc<S>,
        mut renderer: R,
        clock: Arc<dyn Clock>,
        cadence: Duration,
    ) -> Result<Self>
    where
        S: Simulation,
        R: Renderer<S::Snapshot>,
    {
        let running = Arc::new(AtomicBool::new(true));
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);

        let flag = Arc::clone(&running);
        let handle = std::thread::Builder::new()
            .name("update-loop".to_string())
            .spawn(move || {
                run(&*sim, &mut renderer, &*clock, cadence, &flag, &stop_rx);
                flag.store(false, Ordering::Release);
            })?;

        log::info!("Update loop started ({cadence:?} cadence)");
        Ok(Self {
            running,
            stop_tx,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Signal the worker, wake it and wait for it to exit. Idempotent.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.running.store(false, Ordering::Release);
        // Full channel means a wake is already pending
        let _ = self.stop_tx.try_send(());
        if handle.join().is_err() {
            log::warn!("Update loop thread panicked");
        }
        log::info!("Update loop stopped");
    }
}

impl Drop for UpdateLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<S, R>(
    sim: &S,
    renderer: &mut R,
    clock: &dyn Clock,
    cadence: Duration,
    running: &AtomicBool,
    stop_rx: &Receiver<()>,
) where
    S: Simulation,
    R: Renderer<S::Snapshot>,
{
    while running.load(Ordering::Acquire) {
        match stop_rx.recv_timeout(cadence) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        if !running.load(Ordering::Acquire) {
            break;
        }

        // Snapshot under the model's lock, draw outside it
        let snapshot = sim.snapshot();
        renderer.draw(&snapshot);
        sim.integrate(clock.now_ms());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MonotonicClock;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicU64;
    use std::time::Instant;

    #[derive(Default)]
    struct Counter {
        steps: AtomicU64,
        last_now: AtomicU64,
    }

    impl Simulation for Counter {
        type Snapshot = u64;

        fn snapshot(&self) -> u64 {
            self.steps.load(Ordering::SeqCst)
        }

        fn integrate(&self, now_ms: u64) {
            self.steps.fetch_add(1, Ordering::SeqCst);
            self.last_now.store(now_ms, Ordering::SeqCst);
        }
    }

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn test_loop_draws_then_integrates() {
        let sim = Arc::new(Counter::default());
        let drawn = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&drawn);
        let mut update_loop = UpdateLoop::start(
            Arc::clone(&sim),
            move |s: &u64| sink.lock().unwrap().push(*s),
            Arc::new(MonotonicClock::new()),
            Duration::from_millis(1),
        )
        .unwrap();

        assert!(wait_for(|| sim.steps.load(Ordering::SeqCst) >= 5));
        update_loop.stop();
        assert!(!update_loop.is_running());

        // Snapshot k is taken before integrate k, so draws count 0, 1, 2, ...
        let drawn = drawn.lock().unwrap();
        for (i, s) in drawn.iter().enumerate() {
            assert_eq!(*s, i as u64);
        }
        assert_eq!(drawn.len() as u64, sim.steps.load(Ordering::SeqCst));
    }

    #[test]
    fn test_stop_wakes_long_sleep() {
        let sim = Arc::new(Counter::default());
        let mut update_loop = UpdateLoop::start(
            Arc::clone(&sim),
            |_: &u64| {},
            Arc::new(MonotonicClock::new()),
            Duration::from_secs(60),
        )
        .unwrap();
        assert!(update_loop.is_running());

        let started = Instant::now();
        update_loop.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(sim.steps.load(Ordering::SeqCst), 0);

        // Second stop is a no-op
        update_loop.stop();
    }

    #[test]
    fn test_drop_stops_worker() {
        let sim = Arc::new(Counter::default());
        let update_loop = UpdateLoop::start(
            Arc::clone(&sim),
            |_: &u64| {},
            Arc::new(MonotonicClock::new()),
            Duration::from_millis(1),
        )
        .unwrap();
        assert!(wait_for(|| sim.steps.load(Ordering::SeqCst) >= 1));
        drop(update_loop);

        let after = sim.steps.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(sim.steps.load(Ordering::SeqCst), after);
    }
}
