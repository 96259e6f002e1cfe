use crate::foundation::core::{Affine, Point, Rect};
use crate::foundation::error::{CardError, CardResult};
use crate::foundation::math::mul_div255_u8;
use crate::render::frame::FrameRGBA;

pub type PremulRgba8 = [u8; 4];

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

pub fn over_in_place(dst: &mut FrameRGBA, src: &FrameRGBA, opacity: f32) -> CardResult<()> {
    if dst.width != src.width || dst.height != src.height || dst.data.len() != src.data.len() {
        return Err(CardError::evaluation(
            "over_in_place expects equal-size rgba8 frames",
        ));
    }
    for (d, s) in dst.data.chunks_exact_mut(4).zip(src.data.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Cover the whole frame with a flat color.
pub fn fill_over(dst: &mut FrameRGBA, rgb: [u8; 3], opacity: f32) {
    let src = [rgb[0], rgb[1], rgb[2], 255];
    for d in dst.data.chunks_exact_mut(4) {
        let out = over([d[0], d[1], d[2], d[3]], src, opacity);
        d.copy_from_slice(&out);
    }
}

/// Largest rect with the source aspect ratio that fits centred in `bounds`.
pub fn contain_rect(src_w: u32, src_h: u32, bounds: Rect) -> Rect {
    if src_w == 0 || src_h == 0 {
        let c = bounds.center();
        return Rect::new(c.x, c.y, c.x, c.y);
    }
    let scale = (bounds.width() / f64::from(src_w)).min(bounds.height() / f64::from(src_h));
    let (w, h) = (f64::from(src_w) * scale, f64::from(src_h) * scale);
    let c = bounds.center();
    Rect::new(c.x - w / 2.0, c.y - h / 2.0, c.x + w / 2.0, c.y + h / 2.0)
}

fn sample_bilinear(src: &FrameRGBA, x: f64, y: f64) -> PremulRgba8 {
    let fx = (x - 0.5).clamp(0.0, f64::from(src.width - 1));
    let fy = (y - 0.5).clamp(0.0, f64::from(src.height - 1));
    let (x0, y0) = (fx.floor() as u32, fy.floor() as u32);
    let x1 = (x0 + 1).min(src.width - 1);
    let y1 = (y0 + 1).min(src.height - 1);
    let (tx, ty) = (fx - f64::from(x0), fy - f64::from(y0));
    let px = |x: u32, y: u32| {
        let i = ((y as usize) * (src.width as usize) + x as usize) * 4;
        &src.data[i..i + 4]
    };
    let (a, b, c, d) = (px(x0, y0), px(x1, y0), px(x0, y1), px(x1, y1));
    let mut out = [0u8; 4];
    for i in 0..4 {
        let top = f64::from(a[i]) + (f64::from(b[i]) - f64::from(a[i])) * tx;
        let bottom = f64::from(c[i]) + (f64::from(d[i]) - f64::from(c[i])) * tx;
        out[i] = (top + (bottom - top) * ty).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Draw `src` (premultiplied) through `xf`, which maps source pixels to destination pixels.
pub fn draw_image(
    dst: &mut FrameRGBA,
    src: &FrameRGBA,
    xf: Affine,
    opacity: f32,
) -> CardResult<()> {
    if src.width == 0 || src.height == 0 || opacity <= 0.0 {
        return Ok(());
    }
    if src.data.len() != (src.width as usize) * (src.height as usize) * 4 {
        return Err(CardError::evaluation("draw_image source buffer size mismatch"));
    }
    if xf.determinant().abs() < 1e-12 {
        return Ok(());
    }
    let inv = xf.inverse();
    let bbox = xf
        .transform_rect_bbox(Rect::new(0.0, 0.0, f64::from(src.width), f64::from(src.height)))
        .intersect(Rect::new(0.0, 0.0, f64::from(dst.width), f64::from(dst.height)));
    if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
        return Ok(());
    }

    let (sw, sh) = (f64::from(src.width), f64::from(src.height));
    let w = dst.width as usize;
    for y in bbox.y0.floor() as u32..bbox.y1.ceil() as u32 {
        for x in bbox.x0.floor() as u32..bbox.x1.ceil() as u32 {
            let s = inv * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if s.x < 0.0 || s.y < 0.0 || s.x >= sw || s.y >= sh {
                continue;
            }
            let i = ((y as usize) * w + x as usize) * 4;
            let d = &mut dst.data[i..i + 4];
            let out = over([d[0], d[1], d[2], d[3]], sample_bilinear(src, s.x, s.y), opacity);
            d.copy_from_slice(&out);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
