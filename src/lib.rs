//! Tilt Pop - a tilt-driven bouncing ball and a field of popping bubbles
//!
//! Core modules:
//! - `sim`: Shared simulation state (ball and bubbles) and the pure integration steps
//! - `input`: Sensor/touch contracts and the input throttler
//! - `update_loop`: Cancellable fixed-cadence worker (integrate + redraw)
//! - `feedback`: Haptic device contract and the pooled one-shot sounds
//! - `render`: Snapshot to GPU-uploadable circle instances
//! - `session`: Screen-scoped wiring of the above (resume/pause/surface lifecycle)
//! - `settings`: Data-driven constants

pub mod clock;
pub mod error;
pub mod feedback;
pub mod input;
pub mod render;
pub mod session;
pub mod settings;
pub mod sim;
pub mod update_loop;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{Error, Result};
pub use session::{AccelSession, BallSession, BubbleSession};
pub use settings::Settings;

/// Simulation configuration constants (defaults for [`Settings`])
pub mod consts {
    /// Ball radius in pixels
    pub const BALL_RADIUS: f32 = 20.0;
    /// Forcing is in meters/s², drawing is 1 px per meter; this speeds things up
    pub const PIXELS_PER_METER: f32 = 10.0;
    /// Fraction of velocity kept (sign flipped) after hitting an edge
    pub const REBOUND: f32 = 0.8;
    /// Rebound speeds below this stop the ball on that axis
    pub const STOP_BOUNCING_VELOCITY: f32 = 2.0;
    /// Haptic pulse length on a bounce
    pub const BOUNCE_HAPTIC_MS: u64 = 20;

    /// Bubble defaults
    pub const BUBBLE_INITIAL_RADIUS: f32 = 20.0;
    pub const BUBBLE_MAX_RADIUS: f32 = 100.0;
    /// Higher numbers make the bubbles expand faster
    pub const BUBBLE_GROWTH_PER_MS: f32 = 0.08;
    /// Number of pop sounds that can play at once
    pub const POP_POOL_SIZE: usize = 4;

    /// Minimum interval between accepted sensor readings (live simulation)
    pub const TILT_THROTTLE_MS: u64 = 50;
    /// Minimum interval between accepted sensor readings (read-only display)
    pub const DISPLAY_THROTTLE_MS: u64 = 100;

    /// Sleep between update loop iterations
    pub const LOOP_CADENCE_MS: u64 = 5;
}
