//! Tilt Pop headless demo
//!
//! Drives each screen with synthetic platform collaborators:
//! - ball: a bursty, noisy accelerometer and a counting haptic device
//! - bubbles: seeded random taps and pop clips that finish on a timer
//! - sensor display: calibration against a resting bias
//!
//! Usage: `tilt-pop [settings.json]`

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use tilt_pop::feedback::{Haptics, OneShot, SoundPool};
use tilt_pop::input::{SensorListener, SensorReading, SensorSource, TouchEvent};
use tilt_pop::render::{CircleInstance, instance_bytes};
use tilt_pop::sim::{BallSnapshot, BubbleSnapshot};
use tilt_pop::{AccelSession, BallSession, BubbleSession, Clock, MonotonicClock, Settings};

/// Accelerometer stand-in: a background thread emitting noisy readings
/// around `tilt`, in bursts much faster than any throttle.
struct SyntheticSensor {
    tilt: Vec3,
    seed: u64,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SyntheticSensor {
    fn new(tilt: Vec3, seed: u64) -> Self {
        Self {
            tilt,
            seed,
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

impl SensorSource for SyntheticSensor {
    fn register(&mut self, listener: Arc<dyn SensorListener>) -> bool {
        self.unregister();
        self.stop.store(false, Ordering::Release);

        let stop = Arc::clone(&self.stop);
        let tilt = self.tilt;
        let mut rng = Pcg32::seed_from_u64(self.seed);
        let spawned = std::thread::Builder::new()
            .name("synthetic-sensor".to_string())
            .spawn(move || {
                while !stop.load(Ordering::Acquire) {
                    let burst = rng.random_range(1..12);
                    for _ in 0..burst {
                        let noise = Vec3::new(
                            rng.random_range(-0.3..0.3),
                            rng.random_range(-0.3..0.3),
                            rng.random_range(-0.3..0.3),
                        );
                        let v = tilt + noise;
                        listener.on_sensor_changed(&SensorReading::new(v.x, v.y, v.z));
                    }
                    std::thread::sleep(Duration::from_millis(2));
                }
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                true
            }
            Err(e) => {
                log::warn!("Synthetic sensor failed to start: {e}");
                false
            }
        }
    }

    fn unregister(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Synthetic sensor thread panicked");
            }
        }
    }
}

impl Drop for SyntheticSensor {
    fn drop(&mut self) {
        self.unregister();
    }
}

#[derive(Default)]
struct CountingHaptics {
    pulses: AtomicUsize,
}

impl Haptics for CountingHaptics {
    fn vibrate(&self, duration_ms: u64) {
        self.pulses.fetch_add(1, Ordering::Relaxed);
        log::debug!("bzzt ({duration_ms}ms)");
    }
}

/// Pop sound stand-in: "plays" for a fixed time on its own thread, then
/// hands itself back to the pool.
struct TimedClip {
    id: usize,
    length: Duration,
    played: Arc<AtomicUsize>,
}

impl OneShot for TimedClip {
    fn play(self, pool: Arc<SoundPool<Self>>) {
        self.played.fetch_add(1, Ordering::Relaxed);
        log::debug!("pop! (clip {})", self.id);
        std::thread::spawn(move || {
            std::thread::sleep(self.length);
            pool.on_completion(self);
        });
    }

    fn rewind(&mut self) {}

    fn discard(self) {
        log::debug!("clip {} released", self.id);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> tilt_pop::Result<()> {
    let settings = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading settings from {path}");
            Settings::from_json_str(&std::fs::read_to_string(path)?)?
        }
        None => Settings::default(),
    };
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());

    run_ball(&settings, &clock)?;
    run_bubbles(&settings, &clock)?;
    run_accel(&settings, &clock);
    Ok(())
}

fn run_ball(settings: &Settings, clock: &Arc<dyn Clock>) -> tilt_pop::Result<()> {
    log::info!("== Bouncing ball ==");
    let mut session = BallSession::new(*settings, Arc::clone(clock));
    let haptics = Arc::new(CountingHaptics::default());

    // Tilted left and toward the user: the ball heads for the lower-left corner
    let sensor = SyntheticSensor::new(Vec3::new(-3.0, -9.0, 1.0), 42);
    session.resume(Box::new(sensor), Some(haptics.clone()));

    let frames = Arc::new(AtomicUsize::new(0));
    let last = Arc::new(Mutex::new(None::<BallSnapshot>));
    let (frame_count, last_seen) = (Arc::clone(&frames), Arc::clone(&last));
    session.surface_created(move |snap: &BallSnapshot| {
        frame_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = last_seen.lock() {
            *last = Some(*snap);
        }
    })?;
    session.surface_changed(320.0, 480.0);
    session.place_ball(160.0, 100.0);

    std::thread::sleep(Duration::from_secs(3));
    session.pause();
    session.surface_destroyed();

    let last = last.lock().ok().and_then(|s| *s);
    if let Some(snap) = last {
        let instance = CircleInstance::from(&snap);
        log::info!(
            "Ball resting at ({:.1}, {:.1}), instance {:?}",
            snap.pos.x,
            snap.pos.y,
            instance.center
        );
    }
    log::info!(
        "{} frames drawn, {} haptic pulses",
        frames.load(Ordering::Relaxed),
        haptics.pulses.load(Ordering::Relaxed)
    );
    Ok(())
}

fn run_bubbles(settings: &Settings, clock: &Arc<dyn Clock>) -> tilt_pop::Result<()> {
    log::info!("== Bubbles ==");
    let mut session = BubbleSession::new(*settings, Arc::clone(clock));

    let played = Arc::new(AtomicUsize::new(0));
    session.resume((0..settings.bubbles.pool_size).map(|id| TimedClip {
        id,
        length: Duration::from_millis(150),
        played: Arc::clone(&played),
    }));

    let peak = Arc::new(AtomicUsize::new(0));
    let peak_seen = Arc::clone(&peak);
    session.surface_created(move |snap: &BubbleSnapshot| {
        let instances = snap.instances();
        peak_seen.fetch_max(instances.len(), Ordering::Relaxed);
        log::trace!("{} bytes of bubble instances", instance_bytes(&instances).len());
    })?;
    session.surface_changed(320.0, 480.0);

    let mut rng = Pcg32::seed_from_u64(7);
    for _ in 0..40 {
        let x = rng.random_range(0.0..320.0);
        let y = rng.random_range(0.0..480.0);
        session.touch(TouchEvent::press(x, y));
        std::thread::sleep(Duration::from_millis(rng.random_range(10..120)));
    }
    std::thread::sleep(Duration::from_secs(2));

    session.pause();
    session.surface_destroyed();
    log::info!(
        "Peak {} bubbles on screen, {} pop sounds played, {} left",
        peak.load(Ordering::Relaxed),
        played.load(Ordering::Relaxed),
        session.model().len()
    );
    Ok(())
}

fn run_accel(settings: &Settings, clock: &Arc<dyn Clock>) {
    log::info!("== Sensor display ==");
    let mut session = AccelSession::new(*settings, Arc::clone(clock));
    let sensor = SyntheticSensor::new(Vec3::new(0.2, -0.1, 9.8), 99);
    session.resume(Box::new(sensor));

    std::thread::sleep(Duration::from_millis(300));
    for label in session.display().labels() {
        log::info!("before calibration  {label}");
    }
    session.calibrate();
    std::thread::sleep(Duration::from_millis(300));
    for label in session.display().labels() {
        log::info!("after calibration   {label}");
    }
    session.pause();
}
