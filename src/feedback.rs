//! Feedback devices: haptic pulses and pooled one-shot sounds
//!
//! Feedback is best-effort. A missing haptic device or an empty sound pool
//! skips the side effect; the simulation step never waits for either.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Fire-and-forget vibration
pub trait Haptics: Send + Sync {
    fn vibrate(&self, duration_ms: u64);
}

/// A reusable short sound (e.g. a pop)
///
/// Playback finishes asynchronously; the implementation must hand itself
/// back through [`SoundPool::on_completion`] when it does.
pub trait OneShot: Send + Sized + 'static {
    /// Start playing. Must not block.
    fn play(self, pool: Arc<SoundPool<Self>>);
    /// Seek back to the start so the clip can be played again
    fn rewind(&mut self);
    /// Free the underlying device resource
    fn discard(self);
}

struct PoolInner<C> {
    idle: VecDeque<C>,
    running: bool,
}

/// Fixed set of reusable clips with an active/torn-down flag.
///
/// Clips that finish after [`SoundPool::close`] are discarded instead of
/// going back into the pool.
pub struct SoundPool<C> {
    inner: Mutex<PoolInner<C>>,
}

impl<C: OneShot> SoundPool<C> {
    /// A closed, empty pool
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PoolInner {
                idle: VecDeque::new(),
                running: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolInner<C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fill the pool and mark it running
    pub fn open(&self, clips: impl IntoIterator<Item = C>) {
        let mut inner = self.lock();
        inner.idle.extend(clips);
        inner.running = true;
        log::debug!("Sound pool opened with {} clips", inner.idle.len());
    }

    /// Mark the pool torn down and discard every idle clip
    pub fn close(&self) {
        let idle: Vec<C> = {
            let mut inner = self.lock();
            inner.running = false;
            inner.idle.drain(..).collect()
        };
        log::debug!("Sound pool closed, discarding {} clips", idle.len());
        for clip in idle {
            clip.discard();
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Number of idle clips
    pub fn available(&self) -> usize {
        self.lock().idle.len()
    }

    /// Take an idle clip, if any
    pub fn acquire(&self) -> Option<C> {
        self.lock().idle.pop_front()
    }

    /// Put a clip back (no-op discard if the pool is torn down)
    pub fn release(&self, clip: C) {
        let rejected = {
            let mut inner = self.lock();
            if inner.running {
                inner.idle.push_back(clip);
                None
            } else {
                Some(clip)
            }
        };
        if let Some(clip) = rejected {
            log::debug!("Sound pool closed, discarding released clip");
            clip.discard();
        }
    }

    /// Playback finished: rewind and return to the pool while running.
    ///
    /// Returns true if the clip went back into the pool.
    pub fn on_completion(&self, mut clip: C) -> bool {
        let rejected = {
            let mut inner = self.lock();
            if inner.running {
                clip.rewind();
                inner.idle.push_back(clip);
                None
            } else {
                Some(clip)
            }
        };
        match rejected {
            Some(clip) => {
                clip.discard();
                false
            }
            None => true,
        }
    }

    /// Acquire a clip and start it; silently skipped when none is idle
    pub fn play_one(self: &Arc<Self>) -> bool {
        match self.acquire() {
            Some(clip) => {
                clip.play(Arc::clone(self));
                true
            }
            None => {
                log::trace!("No idle clip, skipping sound");
                false
            }
        }
    }
}

impl<C: OneShot> Default for SoundPool<C> {
    fn default() -> Self {
        Self::new()
    }
}
