//! HDR post chain: bloom, tone mapping, vignette and sRGB encoding.

use crate::foundation::core::Rgb;
use crate::foundation::error::{CardError, CardResult};
use crate::foundation::math::{linear_to_srgb, smoothstep};
use crate::render::frame::FrameRGBA;
use crate::render::splat::HdrBuffer;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostSettings {
    pub bloom_threshold: f32,
    pub bloom_smoothing: f32,
    pub bloom_intensity: f32,
    /// Number of half-resolution blur levels.
    pub bloom_levels: u32,
    /// Weight of the coarser level when folding levels back up, `[0, 1]`.
    pub bloom_radius: f32,
    pub exposure: f32,
    pub vignette_offset: f32,
    pub vignette_darkness: f32,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self {
            bloom_threshold: 0.2,
            bloom_smoothing: 0.9,
            bloom_intensity: 1.5,
            bloom_levels: 5,
            bloom_radius: 0.85,
            exposure: 1.5,
            vignette_offset: 0.1,
            vignette_darkness: 1.1,
        }
    }
}

const BLUR_RADIUS: u32 = 3;
const BLUR_SIGMA: f32 = 1.5;

/// Normalized gaussian weights for `2 * radius + 1` taps.
pub fn gaussian_kernel(radius: u32, sigma: f32) -> CardResult<Vec<f32>> {
    if radius == 0 {
        return Ok(vec![1.0]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(CardError::validation("blur sigma must be finite and > 0"));
    }
    let r = radius as i32;
    let denom = 2.0 * sigma * sigma;
    let weights: Vec<f32> = (-r..=r)
        .map(|i| {
            let x = i as f32;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    if sum <= 0.0 {
        return Err(CardError::evaluation("gaussian kernel sum is zero"));
    }
    Ok(weights.into_iter().map(|w| w / sum).collect())
}

/// Separable blur with clamped edges.
pub fn blur(buf: &HdrBuffer, kernel: &[f32]) -> HdrBuffer {
    if kernel.len() <= 1 {
        return buf.clone();
    }
    let mut tmp = HdrBuffer::new(buf.width(), buf.height(), Rgb::BLACK);
    let mut out = HdrBuffer::new(buf.width(), buf.height(), Rgb::BLACK);
    horizontal_blur(buf.pixels(), tmp.pixels_mut(), buf.width(), buf.height(), kernel);
    vertical_blur(tmp.pixels(), out.pixels_mut(), buf.width(), buf.height(), kernel);
    out
}

fn horizontal_blur(src: &[[f32; 3]], dst: &mut [[f32; 3]], width: u32, height: u32, k: &[f32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0f32; 3];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let s = src[(y * w + sx) as usize];
                for c in 0..3 {
                    acc[c] += kw * s[c];
                }
            }
            dst[(y * w + x) as usize] = acc;
        }
    }
}

fn vertical_blur(src: &[[f32; 3]], dst: &mut [[f32; 3]], width: u32, height: u32, k: &[f32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0f32; 3];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let s = src[(sy * w + x) as usize];
                for c in 0..3 {
                    acc[c] += kw * s[c];
                }
            }
            dst[(y * w + x) as usize] = acc;
        }
    }
}

fn downsample(src: &HdrBuffer) -> HdrBuffer {
    let w = src.width().div_ceil(2).max(1);
    let h = src.height().div_ceil(2).max(1);
    let mut out = HdrBuffer::new(w, h, Rgb::BLACK);
    let (sw, sh) = (src.width(), src.height());
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0f32; 3];
            let mut n = 0.0;
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let (sx, sy) = (x * 2 + dx, y * 2 + dy);
                if sx < sw && sy < sh {
                    let s = src.get(sx, sy);
                    for c in 0..3 {
                        acc[c] += s[c];
                    }
                    n += 1.0;
                }
            }
            out.pixels_mut()[(y * w + x) as usize] = acc.map(|v| v / n);
        }
    }
    out
}

fn sample_bilinear(src: &HdrBuffer, u: f32, v: f32) -> [f32; 3] {
    let fx = (u * src.width() as f32 - 0.5).clamp(0.0, (src.width() - 1) as f32);
    let fy = (v * src.height() as f32 - 0.5).clamp(0.0, (src.height() - 1) as f32);
    let (x0, y0) = (fx.floor() as u32, fy.floor() as u32);
    let x1 = (x0 + 1).min(src.width() - 1);
    let y1 = (y0 + 1).min(src.height() - 1);
    let (tx, ty) = (fx - x0 as f32, fy - y0 as f32);
    let (a, b, c, d) = (src.get(x0, y0), src.get(x1, y0), src.get(x0, y1), src.get(x1, y1));
    let mut out = [0f32; 3];
    for i in 0..3 {
        let top = a[i] + (b[i] - a[i]) * tx;
        let bottom = c[i] + (d[i] - c[i]) * tx;
        out[i] = top + (bottom - top) * ty;
    }
    out
}

fn upsample(src: &HdrBuffer, width: u32, height: u32) -> HdrBuffer {
    let mut out = HdrBuffer::new(width, height, Rgb::BLACK);
    for y in 0..height {
        let v = (y as f32 + 0.5) / height as f32;
        for x in 0..width {
            let u = (x as f32 + 0.5) / width as f32;
            out.pixels_mut()[(y * width + x) as usize] = sample_bilinear(src, u, v);
        }
    }
    out
}

/// Bright-pass the buffer and blur it over a chain of half-resolution levels.
pub fn bloom(buf: &HdrBuffer, s: &PostSettings) -> CardResult<HdrBuffer> {
    let kernel = gaussian_kernel(BLUR_RADIUS, BLUR_SIGMA)?;
    let mut bright = HdrBuffer::new(buf.width(), buf.height(), Rgb::BLACK);
    for (dst, src) in bright.pixels_mut().iter_mut().zip(buf.pixels()) {
        let lum = Rgb::new(src[0], src[1], src[2]).luminance();
        let k = smoothstep(s.bloom_threshold, s.bloom_threshold + s.bloom_smoothing, lum);
        *dst = src.map(|c| c * k);
    }

    let mut levels = Vec::with_capacity(s.bloom_levels as usize);
    let mut cur = bright;
    for _ in 0..s.bloom_levels.max(1) {
        if cur.width() == 1 && cur.height() == 1 && !levels.is_empty() {
            break;
        }
        cur = blur(&downsample(&cur), &kernel);
        levels.push(cur.clone());
    }

    let radius = s.bloom_radius.clamp(0.0, 1.0);
    let mut acc = levels.pop().unwrap_or(cur);
    while let Some(fine) = levels.pop() {
        let up = upsample(&acc, fine.width(), fine.height());
        let mut mixed = fine;
        for (m, u) in mixed.pixels_mut().iter_mut().zip(up.pixels()) {
            for c in 0..3 {
                m[c] += (u[c] - m[c]) * radius;
            }
        }
        acc = mixed;
    }
    Ok(upsample(&acc, buf.width(), buf.height()))
}

pub fn reinhard(c: f32, exposure: f32) -> f32 {
    let c = (c * exposure).max(0.0);
    c / (1.0 + c)
}

/// Darkening factor at normalized screen position `(u, v)`.
pub fn vignette(u: f32, v: f32, offset: f32, darkness: f32) -> f32 {
    let (dx, dy) = (u - 0.5, v - 0.5);
    let dist = (dx * dx + dy * dy).sqrt();
    smoothstep(0.8, offset * 0.799, dist * (darkness + offset))
}

/// Run the full chain and encode to opaque RGBA8.
#[tracing::instrument(level = "trace", skip_all)]
pub fn finish(mut buf: HdrBuffer, s: &PostSettings) -> CardResult<FrameRGBA> {
    if s.bloom_intensity > 0.0 {
        let glow = bloom(&buf, s)?;
        for (dst, g) in buf.pixels_mut().iter_mut().zip(glow.pixels()) {
            for c in 0..3 {
                dst[c] += g[c] * s.bloom_intensity;
            }
        }
    }

    let (w, h) = (buf.width(), buf.height());
    let mut frame = FrameRGBA::new(w, h);
    for (i, (px, out)) in buf
        .pixels()
        .iter()
        .zip(frame.data.chunks_exact_mut(4))
        .enumerate()
    {
        let x = (i as u32) % w.max(1);
        let y = (i as u32) / w.max(1);
        let vig = vignette(
            (x as f32 + 0.5) / w as f32,
            (y as f32 + 0.5) / h as f32,
            s.vignette_offset,
            s.vignette_darkness,
        );
        for c in 0..3 {
            let v = linear_to_srgb(reinhard(px[c], s.exposure) * vig);
            out[c] = (v * 255.0).round() as u8;
        }
        out[3] = 255;
    }
    Ok(frame)
}

#[cfg(test)]
#[path = "../../tests/unit/render/post.rs"]
mod tests;
