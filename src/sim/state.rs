//! Simulation state and snapshot types
//!
//! Plain data, mutated only by [`super::tick`] and only while the owning
//! model holds its lock.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Playing field size in pixels, as reported by the render surface
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Zero-size bounds mean the surface is gone (or not there yet)
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// The tilt-driven ball
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BallState {
    pub bounds: Bounds,
    /// Center in pixels
    pub pos: Vec2,
    /// Meters per second (model frame, +y is down the screen)
    pub vel: Vec2,
    /// External acceleration, set only through the tilt input
    pub forcing: Vec2,
    /// Time of the previous integration step; `None` until the first tick
    pub last_update_ms: Option<u64>,
}

/// A growing bubble; position is fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    pub pos: Vec2,
    pub radius: f32,
}

impl Bubble {
    pub fn new(pos: Vec2, initial_radius: f32) -> Self {
        Self {
            pos,
            radius: initial_radius,
        }
    }
}

/// All live bubbles of one screen
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BubbleField {
    pub bounds: Bounds,
    /// Live bubbles in creation order
    pub bubbles: Vec<Bubble>,
    pub last_update_ms: Option<u64>,
}

/// What the renderer needs to draw the ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub pos: Vec2,
    pub radius: f32,
}

/// What the renderer needs to draw the bubbles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BubbleSnapshot {
    pub bubbles: Vec<Bubble>,
}

impl BubbleSnapshot {
    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }
}

/// Edges hit during one ball step (only bounces that kept moving count)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounce {
    pub x: bool,
    pub y: bool,
}

impl Bounce {
    /// A simultaneous X+Y bounce is still a single feedback event
    pub fn any(&self) -> bool {
        self.x || self.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_validity() {
        assert!(!Bounds::default().is_valid());
        assert!(!Bounds::new(300.0, 0.0).is_valid());
        assert!(!Bounds::new(-1.0, 10.0).is_valid());
        assert!(Bounds::new(300.0, 500.0).is_valid());
    }

    #[test]
    fn test_bounce_any() {
        assert!(!Bounce::default().any());
        assert!(Bounce { x: true, y: false }.any());
        assert!(Bounce { x: true, y: true }.any());
    }
}
