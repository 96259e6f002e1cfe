use std::sync::Arc;

use crate::eval::evaluator::FrameState;
use crate::foundation::core::{Canvas, Rgb, Vec3};
use crate::foundation::error::CardResult;
use crate::foundation::math::hash01;
use crate::particles::displace::{explosion_alpha, heart_offset, snow_y, tree_offset};
use crate::particles::fields::{
    Fields, RING_OPACITY, RING_SIZE, SNOW_SIZE, TOPPER_POSITION, TreeParticle, WISH_SIZE,
};
use crate::render::camera::{Camera, OrbitRig};
use crate::render::frame::FrameRGBA;
use crate::render::overlay::Overlay;
use crate::render::post::{PostSettings, finish};
use crate::render::splat::{
    HdrBuffer, HeartFragment, PointFragment, PointShape, TreeFragment, plain_point_px,
    shade_heart, shade_point, shade_tree, shader_point_px,
};

pub const BACKGROUND: u32 = 0x02020a;
pub const SNOW_COLOR: u32 = 0xFFE8F0;

const TREE_LIGHT_PINK: Rgb = Rgb::new(1.0, 0.91, 0.94);
const TREE_GOLD: Rgb = Rgb::new(0.98, 0.79, 0.42);
const SALT_TINT: u64 = 0x71A7;
const SALT_SPARKLE: u64 = 0x5BA2;
/// Heart sparkle noise is re-rolled this many times per second.
const SPARKLE_RATE: f64 = 30.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderSettings {
    pub rig: OrbitRig,
    pub post: PostSettings,
}

/// CPU renderer: particle splatting, post chain, overlay.
#[derive(Clone, Debug)]
pub struct CpuRenderer {
    canvas: Canvas,
    fields: Arc<Fields>,
    overlay: Overlay,
    settings: RenderSettings,
}

struct Pass<'a> {
    hdr: HdrBuffer,
    cam: Camera,
    state: &'a FrameState,
    t: f32,
}

impl Pass<'_> {
    fn project(&self, p: Vec3) -> Option<crate::render::camera::Projected> {
        self.cam.project(p, self.hdr.width(), self.hdr.height())
    }

    fn plain(&mut self, world: Vec3, size: f32, color: Rgb, opacity: f32, shape: PointShape) {
        let Some(at) = self.project(world) else {
            return;
        };
        let size_px = plain_point_px(size, at.depth, self.hdr.height());
        let frag = PointFragment {
            color,
            opacity,
            shape,
            size_px,
        }
        .fogged(at.depth);
        self.hdr.splat(at, size_px, |u, v| shade_point(&frag, u, v));
    }

    fn heart(&mut self, world: Vec3, frag: HeartFragment, size: f32) {
        let Some(at) = self.project(world) else {
            return;
        };
        let size_px = shader_point_px(size, at.depth);
        self.hdr.splat(at, size_px, |u, v| shade_heart(&frag, u, v));
    }
}

impl CpuRenderer {
    pub fn new(
        canvas: Canvas,
        fields: Arc<Fields>,
        overlay: Overlay,
        settings: RenderSettings,
    ) -> Self {
        Self {
            canvas,
            fields,
            overlay,
            settings,
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Draw one frame. `video_frame` is the decoded video picture while the overlay is open.
    #[tracing::instrument(level = "trace", skip_all, fields(frame = state.frame.0))]
    pub fn render(
        &self,
        state: &FrameState,
        video_frame: Option<&FrameRGBA>,
    ) -> CardResult<FrameRGBA> {
        let mut pass = Pass {
            hdr: HdrBuffer::new(
                self.canvas.width,
                self.canvas.height,
                Rgb::from_srgb_u32(BACKGROUND),
            ),
            cam: self
                .settings
                .rig
                .camera(state.camera_azimuth, self.canvas.aspect()),
            state,
            t: state.time as f32,
        };

        self.draw_snow(&mut pass);
        self.draw_rings(&mut pass);
        self.draw_tree(&mut pass);
        self.draw_topper(&mut pass);
        self.draw_surprise(&mut pass);
        self.draw_wish(&mut pass);

        let mut frame = finish(pass.hdr, &self.settings.post)?;
        self.overlay.compose(&mut frame, state, video_frame)?;
        Ok(frame)
    }

    fn draw_snow(&self, pass: &mut Pass<'_>) {
        let color = Rgb::from_srgb_u32(SNOW_COLOR);
        for flake in &self.fields.snow {
            let p = Vec3::new(flake.pos.x, snow_y(flake.pos.y, flake.speed, pass.t), flake.pos.z);
            pass.plain(p, SNOW_SIZE, color, 1.0, PointShape::Round);
        }
    }

    fn draw_rings(&self, pass: &mut Pass<'_>) {
        let group = pass.state.scene_rotation;
        for ring in &self.fields.rings {
            let spin = ring.speed * pass.t;
            for p in &ring.points {
                let world = p.rotate_y(spin).rotate_y(group);
                pass.plain(world, RING_SIZE, ring.color, RING_OPACITY, PointShape::Square);
            }
        }
    }

    fn draw_tree(&self, pass: &mut Pass<'_>) {
        let boost = pass.state.tree_boost;
        let group = pass.state.scene_rotation;
        for (i, p) in self.fields.tree.iter().enumerate() {
            let world = tree_offset(p.pos, p.phase, p.height_factor, pass.t).rotate_y(group);
            let Some(at) = pass.project(world) else {
                continue;
            };
            let frag = TreeFragment {
                color: tree_tint(p, i),
                flicker: 0.8 + 0.2 * (pass.t * 2.0 + p.phase).sin(),
                height_factor: p.height_factor,
                boost,
            };
            let size_px = shader_point_px(p.size * (1.0 + boost * 0.5), at.depth);
            pass.hdr.splat(at, size_px, |u, v| shade_tree(&frag, u, v));
        }
    }

    fn draw_topper(&self, pass: &mut Pass<'_>) {
        let boost = pass.state.tree_boost;
        let group = pass.state.scene_rotation;
        let pulse = heart_brightness(pass.t);
        let tick = sparkle_tick(pass.state.time);
        for (i, p) in self.fields.topper.iter().enumerate() {
            let world = heart_offset(p.pos, p.phase, pass.t, 0.0)
                .add(TOPPER_POSITION)
                .rotate_y(group);
            let frag = HeartFragment {
                color: p.color,
                density: p.density,
                sparkle: sparkle(i, tick),
                pulse,
                boost,
                alpha: 1.0,
            };
            let size = p.size * (0.8 + p.density * 0.4) * (1.0 + boost * 0.8);
            pass.heart(world, frag, size);
        }
    }

    fn draw_surprise(&self, pass: &mut Pass<'_>) {
        let Some(s) = pass.state.surprise else {
            return;
        };
        let alpha = explosion_alpha(s.explosion) * s.opacity;
        if alpha <= 0.0 {
            return;
        }
        let pulse = heart_brightness(pass.t);
        let tick = sparkle_tick(pass.state.time);
        for (i, p) in self.fields.surprise.iter().enumerate() {
            let world = heart_offset(p.pos, p.phase, pass.t, s.explosion).rotate_y(s.rotation);
            let frag = HeartFragment {
                color: p.color,
                density: p.density,
                sparkle: sparkle(i, tick),
                pulse,
                boost: s.boost,
                alpha,
            };
            let size = p.size * (0.8 + p.density * 0.4) * (1.0 + s.boost * 0.8);
            pass.heart(world, frag, size);
        }
    }

    fn draw_wish(&self, pass: &mut Pass<'_>) {
        let Some(w) = pass.state.wish else {
            return;
        };
        if w.opacity <= 0.0 {
            return;
        }
        for (i, p) in self.fields.wish.iter().enumerate() {
            let local = p
                .pos
                .add(self.fields.wish_burst_offset(w.index, i).scale(w.burst));
            let world = local.scale(w.scale).rotate_y(w.spin).add(w.position);
            pass.plain(world, WISH_SIZE, p.color, w.opacity, PointShape::Round);
        }
    }
}

/// Outer tree particles are randomly re-tinted light pink or gold, more often near the base.
fn tree_tint(p: &TreeParticle, i: usize) -> Rgb {
    if !p.outer {
        return p.color;
    }
    let h = hash01(SALT_TINT, i as u64, 0);
    if h < 0.25 * p.height_factor {
        TREE_LIGHT_PINK
    } else if h < 0.4 * p.height_factor {
        TREE_GOLD
    } else {
        p.color
    }
}

fn heart_brightness(t: f32) -> f32 {
    (t * 2.5).sin() * 0.2 + 0.8
}

fn sparkle_tick(time: f64) -> u64 {
    (time * SPARKLE_RATE).floor().max(0.0) as u64
}

fn sparkle(i: usize, tick: u64) -> f32 {
    0.7 + 0.3 * hash01(SALT_SPARKLE, i as u64, tick)
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
