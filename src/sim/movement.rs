// src/sim/movement.rs

use crate::geometry::Vec2;

/// Move from `pos` toward `dest` by at most `max_step`.
///
/// Lands exactly on `dest` when it is within reach, so callers can compare
/// positions with `==` to detect arrival.
pub fn step_toward(pos: Vec2, dest: Vec2, max_step: f64) -> Vec2 {
    let d = pos.dist(dest);
    if d <= max_step || d == 0.0 {
        return dest;
    }
    if max_step <= 0.0 {
        return pos;
    }
    let r = max_step / d;
    Vec2::new(pos.x + (dest.x - pos.x) * r, pos.y + (dest.y - pos.y) * r)
}
