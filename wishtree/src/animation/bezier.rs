use crate::foundation::core::Vec3;

/// Evaluate a 3D cubic Bézier curve at `t` (not clamped).
pub fn cubic_bezier(t: f32, p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Vec3 {
    let u = 1.0 - t;
    let b0 = u * u * u;
    let b1 = 3.0 * u * u * t;
    let b2 = 3.0 * u * t * t;
    let b3 = t * t * t;
    p0.scale(b0)
        .add(p1.scale(b1))
        .add(p2.scale(b2))
        .add(p3.scale(b3))
}

#[cfg(test)]
#[path = "../../tests/unit/animation/bezier.rs"]
mod tests;
