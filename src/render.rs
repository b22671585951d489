//! Render-side helpers
//!
//! The simulation hands out snapshots; a render consumer turns them into
//! flat circle instances it can upload as a GPU vertex/instance buffer.

use bytemuck::{Pod, Zeroable};

use crate::sim::{BallSnapshot, Bubble, BubbleSnapshot};

/// One filled circle: center (x, y) in pixels and radius
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CircleInstance {
    pub center: [f32; 2],
    pub radius: f32,
    pub _pad: f32,
}

impl CircleInstance {
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self {
            center: [x, y],
            radius,
            _pad: 0.0,
        }
    }

    /// Layout for an instance-rate vertex buffer
    pub const STRIDE: usize = std::mem::size_of::<Self>();
}

impl From<&BallSnapshot> for CircleInstance {
    fn from(snap: &BallSnapshot) -> Self {
        Self::new(snap.pos.x, snap.pos.y, snap.radius)
    }
}

impl From<&Bubble> for CircleInstance {
    fn from(bubble: &Bubble) -> Self {
        Self::new(bubble.pos.x, bubble.pos.y, bubble.radius)
    }
}

impl BubbleSnapshot {
    pub fn instances(&self) -> Vec<CircleInstance> {
        self.bubbles.iter().map(CircleInstance::from).collect()
    }
}

/// Raw bytes of an instance list, ready for upload
pub fn instance_bytes(instances: &[CircleInstance]) -> &[u8] {
    bytemuck::cast_slice(instances)
}
