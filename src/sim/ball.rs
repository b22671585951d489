//! Shared state of the bouncing ball screen
//!
//! One mutex guards the whole [`BallState`]; every multi-field read or write
//! goes through it. Haptic pulses fire after the lock is released.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Vec2;

use super::state::{BallSnapshot, BallState, Bounce, Bounds};
use super::tick::{elapsed_since, step_ball};
use crate::feedback::Haptics;
use crate::settings::BallSettings;
use crate::update_loop::Simulation;

pub struct BallModel {
    params: BallSettings,
    state: Mutex<BallState>,
    haptics: Mutex<Option<Arc<dyn Haptics>>>,
}

impl BallModel {
    pub fn new(params: BallSettings) -> Self {
        Self {
            params,
            state: Mutex::new(BallState::default()),
            haptics: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BallState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn params(&self) -> &BallSettings {
        &self.params
    }

    /// Set the external acceleration (model frame, +y down the screen)
    pub fn set_forcing(&self, forcing: Vec2) {
        if !forcing.is_finite() {
            log::warn!("Ignoring non-finite forcing {forcing:?}");
            return;
        }
        self.lock().forcing = forcing;
    }

    /// Surface size. An invalid size suspends time: the first tick after a
    /// valid size comes back only re-anchors.
    pub fn set_bounds(&self, width: f32, height: f32) {
        let mut ball = self.lock();
        ball.bounds = Bounds::new(width, height);
        if !ball.bounds.is_valid() {
            ball.last_update_ms = None;
        }
    }

    /// Move the ball, dropping its velocity. Forcing is unchanged, so it
    /// starts falling again on the next tick.
    pub fn set_position(&self, x: f32, y: f32) {
        let mut ball = self.lock();
        ball.pos = Vec2::new(x, y);
        ball.vel = Vec2::ZERO;
    }

    /// Attach or detach the bounce haptic device
    pub fn set_haptics(&self, haptics: Option<Arc<dyn Haptics>>) {
        *self.haptics.lock().unwrap_or_else(PoisonError::into_inner) = haptics;
    }

    /// Position for the renderer, read atomically
    pub fn snapshot(&self) -> BallSnapshot {
        BallSnapshot {
            pos: self.lock().pos,
            radius: self.params.radius,
        }
    }

    /// Full copy of the current state
    pub fn state(&self) -> BallState {
        *self.lock()
    }

    /// One physics step up to `now_ms`.
    ///
    /// No-op until the surface reports a size, on the first tick after that,
    /// and whenever the clock did not advance.
    pub fn integrate(&self, now_ms: u64) -> Bounce {
        let bounce = {
            let mut ball = self.lock();
            if !ball.bounds.is_valid() {
                ball.last_update_ms = None;
                return Bounce::default();
            }
            let Some(elapsed) = elapsed_since(&mut ball.last_update_ms, now_ms) else {
                return Bounce::default();
            };
            step_ball(&mut ball, &self.params, elapsed)
        };

        if bounce.any() {
            log::debug!("Bounce {bounce:?}");
            self.pulse();
        }
        bounce
    }

    fn pulse(&self) {
        let haptics = self
            .haptics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(haptics) = haptics {
            haptics.vibrate(self.params.haptic_ms);
        }
    }
}

impl Simulation for BallModel {
    type Snapshot = BallSnapshot;

    fn snapshot(&self) -> BallSnapshot {
        BallModel::snapshot(self)
    }

    fn integrate(&self, now_ms: u64) {
        BallModel::integrate(self, now_ms);
    }
}
