//! Simulation settings
//!
//! Every tunable constant of the two screens lives here. Defaults mirror
//! [`crate::consts`]; a JSON document may override any subset.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};

/// Bouncing ball physics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallSettings {
    /// Ball radius (pixels)
    pub radius: f32,
    /// Unit conversion applied to both the velocity and the position update
    pub pixels_per_meter: f32,
    /// Fraction of speed kept after an edge hit (0, 1]
    pub rebound: f32,
    /// Rebound speed under which the axis velocity is zeroed
    pub stop_velocity: f32,
    /// Haptic pulse length on a bounce
    pub haptic_ms: u64,
}

impl Default for BallSettings {
    fn default() -> Self {
        Self {
            radius: BALL_RADIUS,
            pixels_per_meter: PIXELS_PER_METER,
            rebound: REBOUND,
            stop_velocity: STOP_BOUNCING_VELOCITY,
            haptic_ms: BOUNCE_HAPTIC_MS,
        }
    }
}

/// Bubble lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleSettings {
    pub initial_radius: f32,
    /// Radius at which a bubble pops
    pub max_radius: f32,
    /// Radius growth per elapsed millisecond
    pub growth_per_ms: f32,
    /// Pop sounds available at once
    pub pool_size: usize,
}

impl Default for BubbleSettings {
    fn default() -> Self {
        Self {
            initial_radius: BUBBLE_INITIAL_RADIUS,
            max_radius: BUBBLE_MAX_RADIUS,
            growth_per_ms: BUBBLE_GROWTH_PER_MS,
            pool_size: POP_POOL_SIZE,
        }
    }
}

/// Sensor throttling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Minimum interval between readings that drive the ball
    pub tilt_throttle_ms: u64,
    /// Minimum interval between readings shown on the sensor display
    pub display_throttle_ms: u64,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            tilt_throttle_ms: TILT_THROTTLE_MS,
            display_throttle_ms: DISPLAY_THROTTLE_MS,
        }
    }
}

/// Update loop cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopSettings {
    pub cadence_ms: u64,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            cadence_ms: LOOP_CADENCE_MS,
        }
    }
}

impl LoopSettings {
    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }
}

/// All settings
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ball: BallSettings,
    pub bubbles: BubbleSettings,
    pub input: InputSettings,
    #[serde(rename = "loop")]
    pub update_loop: LoopSettings,
}

impl Settings {
    /// Parse and validate settings from JSON (missing fields take defaults)
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        let ball = &self.ball;
        if !(ball.radius > 0.0) {
            return Err(invalid("ball.radius must be > 0"));
        }
        if !(ball.pixels_per_meter > 0.0) {
            return Err(invalid("ball.pixels_per_meter must be > 0"));
        }
        if !(ball.rebound > 0.0 && ball.rebound <= 1.0) {
            return Err(invalid("ball.rebound must be in (0, 1]"));
        }
        if !(ball.stop_velocity >= 0.0) {
            return Err(invalid("ball.stop_velocity must be >= 0"));
        }

        let bubbles = &self.bubbles;
        if !(bubbles.initial_radius > 0.0) {
            return Err(invalid("bubbles.initial_radius must be > 0"));
        }
        if !(bubbles.max_radius > bubbles.initial_radius) {
            return Err(invalid("bubbles.max_radius must exceed bubbles.initial_radius"));
        }
        if !(bubbles.growth_per_ms > 0.0) {
            return Err(invalid("bubbles.growth_per_ms must be > 0"));
        }
        if bubbles.pool_size == 0 {
            return Err(invalid("bubbles.pool_size must be > 0"));
        }

        if self.update_loop.cadence_ms == 0 {
            return Err(invalid("loop.cadence_ms must be > 0"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> Error {
    Error::InvalidSetting(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_consts() {
        let s = Settings::default();
        assert_eq!(s.ball.radius, 20.0);
        assert_eq!(s.ball.rebound, 0.8);
        assert_eq!(s.bubbles.pool_size, 4);
        assert_eq!(s.input.tilt_throttle_ms, 50);
        assert_eq!(s.input.display_throttle_ms, 100);
        assert_eq!(s.update_loop.cadence(), Duration::from_millis(5));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let s = Settings::from_json_str(r#"{ "ball": { "radius": 12.0 }, "loop": { "cadence_ms": 8 } }"#)
            .unwrap();
        assert_eq!(s.ball.radius, 12.0);
        assert_eq!(s.ball.pixels_per_meter, PIXELS_PER_METER);
        assert_eq!(s.update_loop.cadence_ms, 8);
        assert_eq!(s.bubbles, BubbleSettings::default());
    }

    #[test]
    fn test_json_round_trip() {
        let s = Settings::default();
        let json = s.to_json_string().unwrap();
        assert_eq!(Settings::from_json_str(&json).unwrap(), s);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut s = Settings::default();
        s.ball.rebound = 1.5;
        assert!(matches!(s.validate(), Err(Error::InvalidSetting(_))));

        let mut s = Settings::default();
        s.bubbles.max_radius = s.bubbles.initial_radius;
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.update_loop.cadence_ms = 0;
        assert!(s.validate().is_err());

        assert!(Settings::from_json_str(r#"{ "ball": { "radius": -1.0 } }"#).is_err());
        assert!(matches!(Settings::from_json_str("not json"), Err(Error::Json(_))));
    }
}
