//! Closed-form per-frame motion, evaluated per particle at render time.

use crate::foundation::core::Vec3;
use crate::particles::fields::SNOW_RANGE;

/// Tree breathing: a slow bob plus a sideways sway that fades toward the tip.
pub fn tree_offset(pos: Vec3, phase: f32, height_factor: f32, t: f32) -> Vec3 {
    let sway = 0.01 * (1.0 - height_factor);
    Vec3::new(
        pos.x + (t * 0.3 + phase).cos() * sway,
        pos.y + (t * 0.5 + phase).sin() * 0.02,
        pos.z + (t * 0.3 + phase).sin() * sway,
    )
}

/// Heartbeat scale factor shared by both hearts.
pub fn heart_pulse(t: f32) -> f32 {
    (t * 2.5).sin() * 0.05 + 1.0
}

/// Pulsed heart particle, pushed outward by `explosion` in `[0, 1]`.
pub fn heart_offset(pos: Vec3, phase: f32, t: f32, explosion: f32) -> Vec3 {
    let p = pos.scale(heart_pulse(t));
    if explosion <= 0.0 {
        return p;
    }
    let jitter = Vec3::new(phase.sin() * 0.5, phase.cos() * 0.5, 0.0);
    let dir = p.normalize_or_zero().add(jitter).normalize_or_zero();
    p.add(dir.scale(explosion * 25.0))
}

/// Heart particle alpha while exploding; gone by the halfway point.
pub fn explosion_alpha(explosion: f32) -> f32 {
    if explosion > 0.0 {
        (1.0 - explosion * 2.0).max(0.0)
    } else {
        1.0
    }
}

/// Snowflake height after falling for `t` seconds, wrapping from the floor back to the top.
pub fn snow_y(y0: f32, speed: f32, t: f32) -> f32 {
    let half = SNOW_RANGE / 2.0;
    (y0 - speed * t + half).rem_euclid(SNOW_RANGE) - half
}

#[cfg(test)]
#[path = "../../tests/unit/particles/displace.rs"]
mod tests;
