//! Integration steps
//!
//! Pure functions over the state types. The shared models call these while
//! holding their lock, so a step is always committed as a whole.

use super::state::{BallState, Bounce, Bubble};
use crate::settings::{BallSettings, BubbleSettings};

/// Milliseconds since the previous step, updating the reference point.
///
/// Returns `None` (advance nothing) on the first reading and whenever the
/// clock did not move forward. A backwards clock re-anchors on `now_ms`.
pub fn elapsed_since(last: &mut Option<u64>, now_ms: u64) -> Option<u64> {
    let prev = last.replace(now_ms)?;
    if now_ms > prev { Some(now_ms - prev) } else { None }
}

/// Advance the ball by `elapsed_ms` (semi-implicit Euler, then edge bounces)
///
/// The pixels-per-meter factor scales the velocity update and again the
/// position update, so forcing reaches the position as `ppm²`.
pub fn step_ball(ball: &mut BallState, params: &BallSettings, elapsed_ms: u64) -> Bounce {
    let dt = elapsed_ms as f32 / 1000.0;
    let ppm = params.pixels_per_meter;

    ball.vel += ball.forcing * dt * ppm;
    ball.pos += ball.vel * dt * ppm;

    let y = bounce_axis(&mut ball.pos.y, &mut ball.vel.y, ball.bounds.height, params);
    let x = bounce_axis(&mut ball.pos.x, &mut ball.vel.x, ball.bounds.width, params);
    Bounce { x, y }
}

/// Keep one axis inside `[radius, extent - radius]`.
///
/// Returns true if the ball bounced off an edge and is still moving.
fn bounce_axis(pos: &mut f32, vel: &mut f32, extent: f32, params: &BallSettings) -> bool {
    let r = params.radius;

    // Field narrower than the ball: park it in the middle
    if extent < 2.0 * r {
        *pos = extent / 2.0;
        *vel = 0.0;
        return false;
    }

    if *pos - r < 0.0 {
        *pos = r;
    } else if *pos + r > extent {
        *pos = extent - r;
    } else {
        return false;
    }

    *vel = -*vel * params.rebound;
    if vel.abs() < params.stop_velocity {
        *vel = 0.0;
        return false;
    }
    true
}

/// Grow every bubble by `elapsed_ms` and drop the ones that reached max size.
///
/// Returns how many popped this step.
pub fn step_bubbles(bubbles: &mut Vec<Bubble>, params: &BubbleSettings, elapsed_ms: u64) -> usize {
    let growth = elapsed_ms as f32 * params.growth_per_ms;
    for bubble in bubbles.iter_mut() {
        bubble.radius += growth;
    }

    let before = bubbles.len();
    bubbles.retain(|b| b.radius < params.max_radius);
    before - bubbles.len()
}
