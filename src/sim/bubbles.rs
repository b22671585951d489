//! Shared state of the bubbles screen
//!
//! Bubbles appear on touch, grow with elapsed time and pop at max size. A
//! pop plays one pooled sound per step, no matter how many popped together.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Vec2;

use super::state::{Bounds, Bubble, BubbleField, BubbleSnapshot};
use super::tick::{elapsed_since, step_bubbles};
use crate::feedback::{OneShot, SoundPool};
use crate::settings::BubbleSettings;
use crate::update_loop::Simulation;

pub struct BubbleModel<C: OneShot> {
    params: BubbleSettings,
    field: Mutex<BubbleField>,
    pops: Arc<SoundPool<C>>,
}

impl<C: OneShot> BubbleModel<C> {
    pub fn new(params: BubbleSettings) -> Self {
        Self {
            params,
            field: Mutex::new(BubbleField::default()),
            pops: Arc::new(SoundPool::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BubbleField> {
        self.field.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn params(&self) -> &BubbleSettings {
        &self.params
    }

    /// Pool of pop sounds (opened on resume, closed on pause)
    pub fn pops(&self) -> &Arc<SoundPool<C>> {
        &self.pops
    }

    /// Surface size. An invalid size suspends time: the first tick after a
    /// valid size comes back only re-anchors.
    pub fn set_bounds(&self, width: f32, height: f32) {
        let mut field = self.lock();
        field.bounds = Bounds::new(width, height);
        if !field.bounds.is_valid() {
            field.last_update_ms = None;
        }
    }

    /// New bubble at `(x, y)` with the initial radius
    pub fn add_bubble(&self, x: f32, y: f32) {
        let bubble = Bubble::new(Vec2::new(x, y), self.params.initial_radius);
        self.lock().bubbles.push(bubble);
    }

    pub fn len(&self) -> usize {
        self.lock().bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every live bubble, taken under the lock
    pub fn snapshot(&self) -> BubbleSnapshot {
        BubbleSnapshot {
            bubbles: self.lock().bubbles.clone(),
        }
    }

    /// Grow and pop up to `now_ms`. Returns how many bubbles popped.
    pub fn integrate(&self, now_ms: u64) -> usize {
        let popped = {
            let mut field = self.lock();
            if !field.bounds.is_valid() {
                field.last_update_ms = None;
                return 0;
            }
            let Some(elapsed) = elapsed_since(&mut field.last_update_ms, now_ms) else {
                return 0;
            };
            step_bubbles(&mut field.bubbles, &self.params, elapsed)
        };

        if popped > 0 {
            log::debug!("{popped} bubble(s) popped");
            self.pops.play_one();
        }
        popped
    }
}

impl<C: OneShot> Simulation for BubbleModel<C> {
    type Snapshot = BubbleSnapshot;

    fn snapshot(&self) -> BubbleSnapshot {
        BubbleModel::snapshot(self)
    }

    fn integrate(&self, now_ms: u64) {
        BubbleModel::integrate(self, now_ms);
    }
}
