use crate::foundation::core::Vec3;

pub const CAMERA_POSITION: Vec3 = Vec3::new(8.0, 6.0, 8.0);
pub const CAMERA_FOV_DEG: f32 = 50.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;

/// Orbit rig around a target, with distance and polar-angle limits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitRig {
    pub position: Vec3,
    pub target: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar angle limits measured from +Y, in radians.
    pub min_polar: f32,
    pub max_polar: f32,
}

impl Default for OrbitRig {
    fn default() -> Self {
        Self {
            position: CAMERA_POSITION,
            target: Vec3::ZERO,
            min_distance: 5.0,
            max_distance: 25.0,
            min_polar: std::f32::consts::PI / 4.0,
            max_polar: std::f32::consts::PI / 1.8,
        }
    }
}

impl OrbitRig {
    /// Camera after orbiting `azimuth` radians around +Y, with the rig limits applied.
    pub fn camera(&self, azimuth: f32, aspect: f32) -> Camera {
        let offset = self.position.sub(self.target);
        let radius = offset
            .length()
            .clamp(self.min_distance, self.max_distance);
        let polar = if offset.length() > 0.0 {
            (offset.y / offset.length()).clamp(-1.0, 1.0).acos()
        } else {
            self.min_polar
        }
        .clamp(self.min_polar, self.max_polar);
        let theta = offset.x.atan2(offset.z) + azimuth;

        let eye = self.target.add(Vec3::new(
            radius * polar.sin() * theta.sin(),
            radius * polar.cos(),
            radius * polar.sin() * theta.cos(),
        ));
        Camera::look_at(eye, self.target, aspect)
    }
}

/// A point in screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    pub x: f32,
    pub y: f32,
    /// Distance in front of the camera along its view axis.
    pub depth: f32,
}

/// Perspective camera looking down its own -Z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    right: Vec3,
    up: Vec3,
    forward: Vec3,
    focal: f32,
    aspect: f32,
}

impl Camera {
    pub fn look_at(eye: Vec3, target: Vec3, aspect: f32) -> Self {
        let forward = target.sub(eye).normalize_or_zero();
        let right = forward.cross(Vec3::new(0.0, 1.0, 0.0)).normalize_or_zero();
        let up = right.cross(forward);
        Self {
            eye,
            right,
            up,
            forward,
            focal: 1.0 / (CAMERA_FOV_DEG.to_radians() / 2.0).tan(),
            aspect: aspect.max(1e-6),
        }
    }

    /// Project into a `width` x `height` pixel grid; `None` outside the near/far range.
    pub fn project(&self, p: Vec3, width: u32, height: u32) -> Option<Projected> {
        let rel = p.sub(self.eye);
        let depth = rel.dot(self.forward);
        if !(CAMERA_NEAR..=CAMERA_FAR).contains(&depth) {
            return None;
        }
        let ndc_x = self.focal / self.aspect * rel.dot(self.right) / depth;
        let ndc_y = self.focal * rel.dot(self.up) / depth;
        Some(Projected {
            x: (ndc_x + 1.0) * 0.5 * width as f32,
            y: (1.0 - ndc_y) * 0.5 * height as f32,
            depth,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/camera.rs"]
mod tests;
