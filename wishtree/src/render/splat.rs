//! Additive point splatting into a linear HDR buffer.
//!
//! Each material reproduces one fragment model: a point sprite covers a `size` x `size` pixel
//! square and every covered pixel sees its point coordinate in `[0, 1]^2`.

use crate::foundation::core::Rgb;
use crate::foundation::math::smoothstep;
use crate::render::camera::Projected;

/// Largest sprite edge in pixels.
pub const MAX_POINT_PX: f32 = 256.0;
/// Scale for shader-material sizes (`size * 300 / depth`).
pub const SHADER_SIZE_SCALE: f32 = 300.0;

pub const FOG_COLOR: u32 = 0x02020a;
pub const FOG_NEAR: f32 = 8.0;
pub const FOG_FAR: f32 = 30.0;

/// Linear-light RGB accumulation buffer.
#[derive(Clone, Debug)]
pub struct HdrBuffer {
    width: u32,
    height: u32,
    px: Vec<[f32; 3]>,
}

impl HdrBuffer {
    pub fn new(width: u32, height: u32, clear: Rgb) -> Self {
        Self {
            width,
            height,
            px: vec![[clear.r, clear.g, clear.b]; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[[f32; 3]] {
        &self.px
    }

    pub fn pixels_mut(&mut self) -> &mut [[f32; 3]] {
        &mut self.px
    }

    pub fn get(&self, x: u32, y: u32) -> [f32; 3] {
        self.px[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Add `shade(point_coord)` to every pixel whose centre falls inside the sprite.
    ///
    /// `shade` returns `None` for discarded fragments.
    pub fn splat<F>(&mut self, at: Projected, size_px: f32, mut shade: F)
    where
        F: FnMut(f32, f32) -> Option<Rgb>,
    {
        if !size_px.is_finite() || !at.x.is_finite() || !at.y.is_finite() {
            return;
        }
        let size = size_px.clamp(1.0, MAX_POINT_PX);
        let half = size * 0.5;
        let x0 = (at.x - half - 0.5).ceil().max(0.0);
        let y0 = (at.y - half - 0.5).ceil().max(0.0);
        let x1 = (at.x + half - 0.5).floor().min(self.width as f32 - 1.0);
        let y1 = (at.y + half - 0.5).floor().min(self.height as f32 - 1.0);
        if x1 < x0 || y1 < y0 {
            return;
        }

        let w = self.width as usize;
        for py in y0 as u32..=y1 as u32 {
            let v = (py as f32 + 0.5 - (at.y - half)) / size;
            for px in x0 as u32..=x1 as u32 {
                let u = (px as f32 + 0.5 - (at.x - half)) / size;
                if let Some(c) = shade(u, v) {
                    let dst = &mut self.px[(py as usize) * w + px as usize];
                    dst[0] += c.r;
                    dst[1] += c.g;
                    dst[2] += c.b;
                }
            }
        }
    }
}

fn radius(u: f32, v: f32) -> f32 {
    let (dx, dy) = (u - 0.5, v - 0.5);
    (dx * dx + dy * dy).sqrt()
}

/// Inputs of the tree fragment model for one particle.
#[derive(Clone, Copy, Debug)]
pub struct TreeFragment {
    pub color: Rgb,
    /// Twinkle multiplier, `0.8 + 0.2 * sin(...)`.
    pub flicker: f32,
    pub height_factor: f32,
    pub boost: f32,
}

/// Soft round sprite with a warm rim, brightened by the tree boost.
pub fn shade_tree(f: &TreeFragment, u: f32, v: f32) -> Option<Rgb> {
    let r = radius(u, v);
    if r > 0.5 {
        return None;
    }
    let strength = (1.0 - r * 2.0) * f.flicker * (1.0 + f.boost * 1.5);
    let rim = smoothstep(0.3, 0.5, r) * f.height_factor;
    Some(f.color.add(Rgb::new(0.2 * rim, 0.1 * rim, 0.0)).scale(strength))
}

/// Inputs of the heart fragment model for one particle.
#[derive(Clone, Copy, Debug)]
pub struct HeartFragment {
    pub color: Rgb,
    pub density: f32,
    /// `0.7 + 0.3 * noise`.
    pub sparkle: f32,
    /// Heartbeat brightness, `sin(2.5t) * 0.2 + 0.8`.
    pub pulse: f32,
    pub boost: f32,
    pub alpha: f32,
}

/// Bright core plus a halo; additive with `alpha` scaling the contribution.
pub fn shade_heart(f: &HeartFragment, u: f32, v: f32) -> Option<Rgb> {
    let r = radius(u, v);
    if r > 0.5 {
        return None;
    }
    let core = smoothstep(0.5, 0.0, r) * (0.5 + f.density * 0.5);
    let halo = smoothstep(0.5, 0.3, r) * 0.3;
    let k = (core + halo) * f.sparkle * f.pulse * (1.0 + f.boost * 2.0) * f.alpha;
    Some(f.color.scale(k))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointShape {
    /// Antialiased disc.
    Round,
    Square,
}

/// Plain colored point with opacity and linear fog.
#[derive(Clone, Copy, Debug)]
pub struct PointFragment {
    pub color: Rgb,
    pub opacity: f32,
    pub shape: PointShape,
    /// Sprite edge in pixels, used to antialias round points.
    pub size_px: f32,
}

impl PointFragment {
    /// Mix toward the fog color by view depth.
    pub fn fogged(mut self, depth: f32) -> Self {
        let k = smoothstep(FOG_NEAR, FOG_FAR, depth);
        self.color = self.color.lerp(Rgb::from_srgb_u32(FOG_COLOR), k);
        self
    }
}

pub fn shade_point(f: &PointFragment, u: f32, v: f32) -> Option<Rgb> {
    let coverage = match f.shape {
        PointShape::Square => 1.0,
        PointShape::Round => {
            let r = radius(u, v);
            let edge = (1.0 / f.size_px.max(1.0)).min(0.5);
            let c = 1.0 - smoothstep(0.5 - edge, 0.5, r);
            if c <= 0.0 {
                return None;
            }
            c
        }
    };
    Some(f.color.scale(f.opacity * coverage))
}

/// Perspective size for shader materials.
pub fn shader_point_px(size: f32, depth: f32) -> f32 {
    size * SHADER_SIZE_SCALE / depth.max(1e-3)
}

/// Perspective size for plain point materials on a canvas `height` px tall.
pub fn plain_point_px(size: f32, depth: f32, height: u32) -> f32 {
    size * (height as f32 * 0.5) / depth.max(1e-3)
}

#[cfg(test)]
#[path = "../../tests/unit/render/splat.rs"]
mod tests;
