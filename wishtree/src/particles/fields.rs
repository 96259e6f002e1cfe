use std::f32::consts::TAU;

use crate::card::model::SceneDef;
use crate::foundation::core::{Rgb, Vec3};
use crate::foundation::math::{Rng64, hash01};

pub const TREE_HEIGHT: f32 = 10.0;
pub const TREE_MAX_RADIUS: f32 = 4.0;
pub const TOPPER_POSITION: Vec3 = Vec3::new(0.0, 5.2, 0.0);
/// Edge of the cube snow falls through.
pub const SNOW_RANGE: f32 = 30.0;
pub const SNOW_SIZE: f32 = 0.1;
pub const RING_Y: f32 = -5.0;
pub const RING_SIZE: f32 = 0.15;
pub const RING_OPACITY: f32 = 0.6;
pub const WISH_RADIUS: f32 = 0.5;
pub const WISH_SIZE: f32 = 0.2;

const SALT_TREE: u64 = 1;
const SALT_TOPPER: u64 = 2;
const SALT_SURPRISE: u64 = 3;
const SALT_SNOW: u64 = 4;
const SALT_WISH: u64 = 5;
const SALT_BURST: u64 = 6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeParticle {
    pub pos: Vec3,
    pub color: Rgb,
    pub size: f32,
    pub phase: f32,
    /// 1 at the base, 0 at the tip.
    pub height_factor: f32,
    /// Particle sits in the outer 30% of the cone's radius at its height.
    pub outer: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeartParticle {
    pub pos: Vec3,
    pub color: Rgb,
    pub size: f32,
    pub phase: f32,
    /// 1 at the heart's centre line, 0 at its outline.
    pub density: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnowFlake {
    pub pos: Vec3,
    /// Fall speed in units per second.
    pub speed: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ring {
    pub radius: f32,
    /// Spin around +Y in rad/s on top of the scene rotation.
    pub speed: f32,
    pub color: Rgb,
    pub points: Vec<Vec3>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WishParticle {
    pub pos: Vec3,
    pub color: Rgb,
}

/// Every particle field of the card, generated once from its seed.
#[derive(Clone, Debug)]
pub struct Fields {
    seed: u64,
    pub tree: Vec<TreeParticle>,
    pub topper: Vec<HeartParticle>,
    pub surprise: Vec<HeartParticle>,
    pub snow: Vec<SnowFlake>,
    pub rings: Vec<Ring>,
    pub wish: Vec<WishParticle>,
}

impl Fields {
    #[tracing::instrument(skip(scene))]
    pub fn generate(seed: u64, scene: &SceneDef) -> Self {
        let fields = Self {
            seed,
            tree: tree(seed, scene.tree_particles),
            topper: topper(seed, scene.topper_particles),
            surprise: surprise_heart(seed, scene.surprise_particles),
            snow: snow(seed, scene.snow_particles),
            rings: rings(),
            wish: wish_cluster(seed, scene.wish_particles),
        };
        tracing::debug!(points = fields.point_count(), "particle fields generated");
        fields
    }

    pub fn point_count(&self) -> usize {
        self.tree.len()
            + self.topper.len()
            + self.surprise.len()
            + self.snow.len()
            + self.rings.iter().map(|r| r.points.len()).sum::<usize>()
            + self.wish.len()
    }

    /// Outward travel of particle `i` for the `wish`-th accepted wish.
    pub fn wish_burst_offset(&self, wish: usize, i: usize) -> Vec3 {
        let Some(p) = self.wish.get(i) else {
            return Vec3::ZERO;
        };
        let dist = hash01(self.seed ^ SALT_BURST, wish as u64, i as u64) * 5.0 + 2.0;
        p.pos.normalize_or_zero().scale(dist)
    }
}

fn tree(seed: u64, count: u32) -> Vec<TreeParticle> {
    let mut rng = Rng64::stream(seed, SALT_TREE);
    let warm = Rgb::from_srgb_u32(0xFF6B90);
    let soft = Rgb::from_srgb_u32(0xFF9FB5);
    (0..count)
        .map(|_| {
            let y_n = rng.next_f32_01();
            let y = y_n * TREE_HEIGHT - TREE_HEIGHT / 2.0;
            let level_radius = TREE_MAX_RADIUS * (1.0 - y_n);
            let r = rng.next_f32_01().sqrt() * level_radius;
            let theta = rng.next_f32_01() * TAU;
            TreeParticle {
                pos: Vec3::new(r * theta.cos(), y, r * theta.sin()),
                color: warm.lerp(soft, rng.next_f32_01()),
                size: rng.next_f32_01() * 0.2 + 0.05,
                phase: rng.next_f32_01() * TAU,
                height_factor: 1.0 - y_n,
                outer: r > level_radius * 0.7,
            }
        })
        .collect()
}

/// Point on the classic heart curve, before scaling.
pub fn heart_curve(t: f32) -> (f32, f32) {
    let x = 16.0 * t.sin().powi(3);
    let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
    (x, y)
}

fn topper(seed: u64, count: u32) -> Vec<HeartParticle> {
    let mut rng = Rng64::stream(seed, SALT_TOPPER);
    let main = Rgb::from_srgb_u32(0xDF0041);
    let soft = Rgb::from_srgb_u32(0xFF9FB5);
    let gold = Rgb::from_srgb_u32(0xFBC96B);
    (0..count)
        .map(|_| {
            let t = rng.next_f32_01() * TAU;
            let r = rng.next_f32_01().sqrt();
            let (x, y) = heart_curve(t);
            let scale = 0.08 * r;
            let z = (rng.next_f32_01() - 0.5) * 0.5 * (1.0 - r);
            let pick = rng.next_f32_01();
            let color = if pick > 0.9 {
                gold
            } else if pick > 0.7 {
                soft
            } else {
                main
            };
            HeartParticle {
                pos: Vec3::new(x * scale, y * scale, z),
                color,
                size: rng.next_f32_01() * 0.15 + 0.1,
                phase: rng.next_f32_01() * TAU,
                density: 1.0 - r,
            }
        })
        .collect()
}

fn surprise_heart(seed: u64, count: u32) -> Vec<HeartParticle> {
    let mut rng = Rng64::stream(seed, SALT_SURPRISE);
    let main = Rgb::from_srgb_u32(0xFF1053);
    let light = Rgb::from_srgb_u32(0xFF80A0);
    (0..count)
        .map(|_| {
            let t = rng.next_f32_01() * TAU;
            let r = rng.next_f32_01().sqrt();
            let (x, y) = heart_curve(t);
            let scale = 0.12 * r;
            let z = (rng.next_f32_01() - 0.5) * 2.0 * (1.0 - r);
            let color = if rng.next_f32_01() > 0.8 {
                Rgb::WHITE
            } else {
                main.lerp(light, rng.next_f32_01())
            };
            HeartParticle {
                pos: Vec3::new(x * scale, y * scale + 3.0, z),
                color,
                size: rng.next_f32_01() * 0.3 + 0.1,
                phase: rng.next_f32_01() * TAU,
                density: 1.0 - r,
            }
        })
        .collect()
}

fn snow(seed: u64, count: u32) -> Vec<SnowFlake> {
    let mut rng = Rng64::stream(seed, SALT_SNOW);
    (0..count)
        .map(|_| {
            let x = (rng.next_f32_01() - 0.5) * SNOW_RANGE;
            let y = (rng.next_f32_01() - 0.5) * SNOW_RANGE;
            let z = (rng.next_f32_01() - 0.5) * SNOW_RANGE;
            SnowFlake {
                pos: Vec3::new(x, y, z),
                speed: 0.5 + rng.next_f32_01() * 1.5,
            }
        })
        .collect()
}

fn rings() -> Vec<Ring> {
    let gold = Rgb::from_srgb_u32(0xFBC96B);
    let soft = Rgb::from_srgb_u32(0xFF9FB5);
    [(4.5, 0.1, 200, gold), (5.5, -0.08, 250, soft), (6.5, 0.05, 300, gold)]
        .into_iter()
        .map(|(radius, speed, count, color)| Ring {
            radius,
            speed,
            color,
            points: (0..count)
                .map(|i| {
                    let theta = i as f32 / count as f32 * TAU;
                    Vec3::new(theta.cos() * radius, RING_Y, theta.sin() * radius)
                })
                .collect(),
        })
        .collect()
}

fn wish_cluster(seed: u64, count: u32) -> Vec<WishParticle> {
    let mut rng = Rng64::stream(seed, SALT_WISH);
    let warm = Rgb::from_srgb_u32(0xFF6B90);
    (0..count)
        .map(|_| {
            let r = rng.next_f32_01() * WISH_RADIUS;
            let theta = rng.next_f32_01() * TAU;
            let phi = (2.0 * rng.next_f32_01() - 1.0).acos();
            WishParticle {
                pos: Vec3::new(
                    r * phi.sin() * theta.cos(),
                    r * phi.sin() * theta.sin(),
                    r * phi.cos(),
                ),
                color: warm.lerp(Rgb::WHITE, (r * 2.0).min(1.0)),
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/particles/fields.rs"]
mod tests;
