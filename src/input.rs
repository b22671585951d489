//! Sensor and touch input
//!
//! Sensor callbacks arrive on the platform's event thread, often far faster
//! than the simulation needs. [`Throttler`] drops readings that come in
//! sooner than a minimum interval after the last accepted one; accepted
//! readings are forwarded into shared state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::sim::BallModel;

/// Sensor accuracy as reported alongside readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Accuracy {
    #[default]
    Unreliable,
    Low,
    Medium,
    High,
}

impl Accuracy {
    pub fn label(&self) -> &'static str {
        match self {
            Accuracy::Unreliable => "Accuracy: Unreliable",
            Accuracy::Low => "Accuracy: Low",
            Accuracy::Medium => "Accuracy: Medium",
            Accuracy::High => "Accuracy: High",
        }
    }
}

/// One raw accelerometer sample (m/s², device axes)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub values: Vec3,
    pub accuracy: Accuracy,
}

impl SensorReading {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            values: Vec3::new(x, y, z),
            accuracy: Accuracy::High,
        }
    }
}

/// Receives sensor callbacks (called from the event thread)
pub trait SensorListener: Send + Sync {
    fn on_sensor_changed(&self, reading: &SensorReading);

    /// Rare; never throttled
    fn on_accuracy_changed(&self, _accuracy: Accuracy) {}
}

/// Platform accelerometer
pub trait SensorSource {
    /// Start delivering to `listener`. Returns false if there is no such sensor.
    fn register(&mut self, listener: Arc<dyn SensorListener>) -> bool;

    /// Stop delivering to the registered listener
    fn unregister(&mut self);
}

/// Whether resume found a working sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorStatus {
    Active,
    /// Input stays neutral for this session
    Unsupported,
}

/// Touch transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    Press,
    Move,
    Release,
}

/// A discrete touch at surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub action: TouchAction,
    pub x: f32,
    pub y: f32,
}

impl TouchEvent {
    pub fn press(x: f32, y: f32) -> Self {
        Self {
            action: TouchAction::Press,
            x,
            y,
        }
    }
}

/// Minimum-interval rate limiter
#[derive(Debug, Clone, Copy)]
pub struct Throttler {
    min_interval_ms: u64,
    last_accepted_ms: Option<u64>,
}

impl Throttler {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms,
            last_accepted_ms: None,
        }
    }

    /// Accept the first event and any event at least `min_interval_ms`
    /// after the previously accepted one. Accepting moves the reference.
    pub fn accept(&mut self, now_ms: u64) -> bool {
        let accepted = match self.last_accepted_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.min_interval_ms,
        };
        if accepted {
            self.last_accepted_ms = Some(now_ms);
        }
        accepted
    }

    pub fn reset(&mut self) {
        self.last_accepted_ms = None;
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Raw device acceleration to model forcing: screen y grows downward
pub fn tilt_to_forcing(values: Vec3) -> Vec2 {
    Vec2::new(values.x, -values.y)
}

/// Feeds throttled accelerometer readings into the ball's forcing.
///
/// A forward runs entirely under the throttle lock, and [`detach`] takes
/// that lock too: once it returns, no callback can still write forcing.
///
/// [`detach`]: TiltInput::detach
pub struct TiltInput {
    model: Arc<BallModel>,
    clock: Arc<dyn Clock>,
    throttle: Mutex<Throttler>,
    attached: AtomicBool,
}

impl TiltInput {
    pub fn new(model: Arc<BallModel>, clock: Arc<dyn Clock>, min_interval_ms: u64) -> Self {
        Self {
            model,
            clock,
            throttle: Mutex::new(Throttler::new(min_interval_ms)),
            attached: AtomicBool::new(true),
        }
    }

    /// Stop forwarding. Waits for a forward already in progress.
    pub fn detach(&self) {
        let _throttle = lock(&self.throttle);
        self.attached.store(false, Ordering::Release);
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }
}

impl SensorListener for TiltInput {
    fn on_sensor_changed(&self, reading: &SensorReading) {
        let mut throttle = lock(&self.throttle);
        if !self.is_attached() {
            return;
        }
        let now = self.clock.now_ms();
        if !throttle.accept(now) {
            return;
        }
        log::trace!("Tilt accepted at {now}ms: {:?}", reading.values);
        self.model.set_forcing(tilt_to_forcing(reading.values));
    }
}

/// Latest reading as shown on the sensor display
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayReading {
    /// Raw reading plus the calibration offset
    pub values: Vec3,
    /// Calibration offset
    pub offset: Vec3,
    pub accuracy: Accuracy,
}

impl DisplayReading {
    /// `"X: +0.12345 (-9.80000)"` style labels, one per axis
    pub fn labels(&self) -> [String; 3] {
        [
            format!("X: {:+.5} ({:+.5})", self.values.x, self.offset.x),
            format!("Y: {:+.5} ({:+.5})", self.values.y, self.offset.y),
            format!("Z: {:+.5} ({:+.5})", self.values.z, self.offset.z),
        ]
    }
}

#[derive(Debug, Default)]
struct DisplayState {
    raw: Vec3,
    offset: Vec3,
    accuracy: Accuracy,
}

/// Read-only accelerometer display with one-shot calibration.
///
/// The offset only changes what is displayed; it never reaches any forcing.
pub struct AccelDisplay {
    clock: Arc<dyn Clock>,
    throttle: Mutex<Throttler>,
    state: Mutex<DisplayState>,
    attached: AtomicBool,
}

impl AccelDisplay {
    pub fn new(clock: Arc<dyn Clock>, min_interval_ms: u64) -> Self {
        Self {
            clock,
            throttle: Mutex::new(Throttler::new(min_interval_ms)),
            state: Mutex::new(DisplayState::default()),
            attached: AtomicBool::new(false),
        }
    }

    pub fn attach(&self) {
        let mut throttle = lock(&self.throttle);
        throttle.reset();
        self.attached.store(true, Ordering::Release);
    }

    pub fn detach(&self) {
        let _throttle = lock(&self.throttle);
        self.attached.store(false, Ordering::Release);
    }

    /// Zero out the resting bias: offset = -(current raw reading)
    pub fn calibrate(&self) {
        let mut state = lock(&self.state);
        state.offset = -state.raw;
        log::debug!("Calibrated, offset {:?}", state.offset);
    }

    pub fn reset_calibration(&self) {
        lock(&self.state).offset = Vec3::ZERO;
    }

    pub fn reading(&self) -> DisplayReading {
        let state = lock(&self.state);
        DisplayReading {
            values: state.raw + state.offset,
            offset: state.offset,
            accuracy: state.accuracy,
        }
    }
}

impl SensorListener for AccelDisplay {
    fn on_sensor_changed(&self, reading: &SensorReading) {
        let mut throttle = lock(&self.throttle);
        if !self.attached.load(Ordering::Acquire) {
            return;
        }
        if !throttle.accept(self.clock.now_ms()) {
            return;
        }
        lock(&self.state).raw = reading.values;
    }

    fn on_accuracy_changed(&self, accuracy: Accuracy) {
        lock(&self.state).accuracy = accuracy;
    }
}
