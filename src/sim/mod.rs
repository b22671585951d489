//! Simulation module
//!
//! Data types and pure integration steps, plus the two lock-guarded shared
//! models the update loop and the input side both talk to.
//! - No rendering or platform dependencies
//! - All state mutation happens under the owning model's lock

pub mod ball;
pub mod bubbles;
pub mod state;
pub mod tick;

pub use ball::BallModel;
pub use bubbles::BubbleModel;
pub use state::{BallSnapshot, BallState, Bounce, Bounds, Bubble, BubbleField, BubbleSnapshot};
pub use tick::{elapsed_since, step_ball, step_bubbles};
