//! UI overlay drawn as SVG and rasterised with resvg.
//!
//! Layout is in CSS pixels (canvas size divided by the pixel ratio); the root `viewBox` scales it
//! to device pixels.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use crate::card::model::TitleDef;
use crate::choreo::music::MusicState;
use crate::eval::evaluator::FrameState;
use crate::foundation::core::{Affine, Canvas, Rect, Vec2};
use crate::foundation::error::{CardError, CardResult};
use crate::render::composite::{contain_rect, draw_image, fill_over, over_in_place};
use crate::render::frame::FrameRGBA;

pub const ACCENT: &str = "#FF9FB5";
pub const TITLE_HIGHLIGHT: &str = "#FFE8F0";
pub const ERROR_TEXT: &str = "#FCA5A5";
pub const WISH_PLACEHOLDER: &str = "Make a wish...";
pub const MUSIC_ERROR_TEXT: &str = "Music File Error";

const PLAY_ICON: &str = "M10 18a8 8 0 100-16 8 8 0 000 16zM9.555 7.168A1 1 0 008 8v4a1 1 0 001.555.832l3-2a1 1 0 000-1.664l-3-2z";
const PAUSE_ICON: &str = "M18 10a8 8 0 11-16 0 8 8 0 0116 0zM7 8a1 1 0 012 0v4a1 1 0 11-2 0V8zm5-1a1 1 0 00-1 1v4a1 1 0 102 0V8a1 1 0 00-1-1z";
const ERROR_ICON: &str = "M18 10a8 8 0 11-16 0 8 8 0 0116 0zm-7 4a1 1 0 11-2 0 1 1 0 012 0zm-1-9a1 1 0 00-1 1v4a1 1 0 102 0V6a1 1 0 00-1-1z";

const WISH_BOX_W: f64 = 324.0;
const WISH_BOX_H: f64 = 54.0;
const WISH_INPUT_W: f64 = 216.0;

/// Overlay geometry shared by every frame of a render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UiLayout {
    pub canvas: Canvas,
    pub pixel_ratio: f64,
}

impl UiLayout {
    /// Canvas size in CSS pixels.
    pub fn css_size(&self) -> Vec2 {
        let pr = if self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0 {
            self.pixel_ratio
        } else {
            1.0
        };
        Vec2::new(
            f64::from(self.canvas.width) / pr,
            f64::from(self.canvas.height) / pr,
        )
    }

    fn open(&self, out: &mut String) {
        let css = self.css_size();
        let _ = write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {:.3} {:.3}">"#,
            self.canvas.width, self.canvas.height, css.x, css.y
        );
    }
}

pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// Title, music button, lyric line and wish box for one frame.
pub fn ui_svg(layout: &UiLayout, title: &TitleDef, state: &FrameState) -> String {
    let css = layout.css_size();
    let (w, h) = (css.x, css.y);
    let mut s = String::with_capacity(4096);
    layout.open(&mut s);
    s.push_str(
        r##"<defs><filter id="glow" x="-50%" y="-50%" width="200%" height="200%"><feDropShadow dx="0" dy="0" stdDeviation="6" flood-color="#DF0041" flood-opacity="0.6"/></filter></defs>"##,
    );

    // Title.
    let _ = write!(
        s,
        r#"<text x="{:.2}" y="62" text-anchor="middle" font-family="serif" font-weight="bold" letter-spacing="0.15em" filter="url(#glow)"><tspan font-size="24" fill="{ACCENT}">{}</tspan><tspan font-size="36" fill="{TITLE_HIGHLIGHT}" dx="12">{}</tspan><tspan font-size="24" fill="{ACCENT}" dx="12">{}</tspan></text>"#,
        w / 2.0,
        xml_escape(&title.lead),
        xml_escape(&title.highlight),
        xml_escape(&title.tail),
    );

    // Music button.
    let (cx, cy) = (w - 36.0, 36.0);
    let error = state.music.state == MusicState::Error;
    let (fill, stroke, icon_fill, icon) = match state.music.state {
        MusicState::Error => (
            "rgba(127,29,29,0.4)",
            "rgba(248,113,113,0.5)",
            "#FECACA",
            ERROR_ICON,
        ),
        MusicState::Playing => (
            "rgba(0,0,0,0.3)",
            "rgba(255,255,255,0.2)",
            "#FFFFFF",
            PAUSE_ICON,
        ),
        MusicState::Paused => (
            "rgba(0,0,0,0.3)",
            "rgba(255,255,255,0.2)",
            "#FFFFFF",
            PLAY_ICON,
        ),
    };
    let _ = write!(
        s,
        r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="20" fill="{fill}" stroke="{stroke}" stroke-width="1"/><g transform="translate({:.2} {:.2}) scale(0.8)"><path d="{icon}" fill="{icon_fill}" fill-rule="evenodd"/></g>"#,
        cx - 8.0,
        cy - 8.0,
    );

    if error {
        let _ = write!(
            s,
            r#"<text x="{:.2}" y="86" text-anchor="end" font-family="sans-serif" font-size="14" fill="{ERROR_TEXT}">{MUSIC_ERROR_TEXT}</text>"#,
            w - 24.0
        );
    } else if let Some(line) = &state.music.lyric {
        let _ = write!(
            s,
            r#"<text x="{:.2}" y="86" text-anchor="end" font-family="sans-serif" font-size="16" fill="{ACCENT}" filter="url(#glow)">{}</text>"#,
            w - 24.0,
            xml_escape(line)
        );
    }

    // Wish box.
    let x0 = w / 2.0 - WISH_BOX_W / 2.0;
    let y0 = h - 32.0 - WISH_BOX_H;
    let _ = write!(
        s,
        r#"<rect x="{x0:.2}" y="{y0:.2}" width="{WISH_BOX_W}" height="{WISH_BOX_H}" rx="{:.1}" fill="rgba(0,0,0,0.5)" stroke="{ACCENT}" stroke-opacity="0.3"/>"#,
        WISH_BOX_H / 2.0
    );
    let (text, color) = if state.wish_box.text.is_empty() {
        (WISH_PLACEHOLDER.to_owned(), "#9CA3AF")
    } else {
        (xml_escape(&state.wish_box.text), "#FFFFFF")
    };
    let _ = write!(
        s,
        r#"<clipPath id="wish-input"><rect x="{:.2}" y="{:.2}" width="{WISH_INPUT_W}" height="30"/></clipPath><text x="{:.2}" y="{:.2}" clip-path="url(#wish-input)" font-family="sans-serif" font-size="16" fill="{color}">{text}</text>"#,
        x0 + 12.0,
        y0 + 12.0,
        x0 + 20.0,
        y0 + 33.0,
    );
    let button_opacity = if state.store.is_wishing { 0.5 } else { 1.0 };
    let bx = x0 + 12.0 + WISH_INPUT_W + 12.0;
    let _ = write!(
        s,
        r#"<g opacity="{button_opacity}"><rect x="{bx:.2}" y="{:.2}" width="72" height="30" rx="15" fill="none" stroke="{ACCENT}"/><text x="{:.2}" y="{:.2}" text-anchor="middle" font-family="sans-serif" font-size="14" letter-spacing="0.05em" fill="{ACCENT}">SEND</text></g>"#,
        y0 + 12.0,
        bx + 36.0,
        y0 + 32.0,
    );

    s.push_str("</svg>");
    s
}

/// Close button of the video overlay, in the un-zoomed frame.
pub fn close_button_svg(layout: &UiLayout) -> String {
    let w = layout.css_size().x;
    let mut s = String::new();
    layout.open(&mut s);
    let x = w - 32.0 - 72.0;
    let _ = write!(
        s,
        r##"<rect x="{x:.2}" y="32" width="72" height="28" rx="14" fill="rgba(0,0,0,0.2)" stroke="rgba(255,255,255,0.3)"/><text x="{:.2}" y="51" text-anchor="middle" font-family="sans-serif" font-size="14" fill="#FFFFFF" fill-opacity="0.7">Close</text></svg>"##,
        x + 36.0
    );
    s
}

pub fn build_fontdb(assets_root: &Path) -> Arc<usvg::fontdb::Database> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    load_fonts_from_dir(&mut db, &assets_root.join("fonts"));
    load_fonts_from_dir(&mut db, assets_root);
    tracing::debug!(faces = db.len(), "overlay fonts loaded");
    Arc::new(db)
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable font");
        }
    }
}

fn font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;
    use usvg::fontdb::Family;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families: Vec<Family<'_>> = font
                .families()
                .iter()
                .map(|family| match family {
                    usvg::FontFamily::Serif => Family::Serif,
                    usvg::FontFamily::SansSerif => Family::SansSerif,
                    usvg::FontFamily::Cursive => Family::Cursive,
                    usvg::FontFamily::Fantasy => Family::Fantasy,
                    usvg::FontFamily::Monospace => Family::Monospace,
                    usvg::FontFamily::Named(s) => Family::Name(s),
                })
                .collect();
            families.extend([Family::SansSerif, Family::Serif, Family::Monospace]);

            let style = match font.style() {
                usvg::FontStyle::Normal => usvg::fontdb::Style::Normal,
                usvg::FontStyle::Italic => usvg::fontdb::Style::Italic,
                usvg::FontStyle::Oblique => usvg::fontdb::Style::Oblique,
            };
            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style,
            };
            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

/// Parse and rasterise an SVG document at its own pixel size.
pub fn rasterize_svg(svg: &str, fontdb: &Arc<usvg::fontdb::Database>) -> CardResult<FrameRGBA> {
    let opts = usvg::Options {
        fontdb: Arc::clone(fontdb),
        font_resolver: font_resolver(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(svg, &opts)
        .map_err(|e| CardError::evaluation(format!("parse overlay svg: {e}")))?;

    let size = tree.size().to_int_size();
    let (width, height) = (size.width(), size.height());
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| CardError::evaluation("failed to allocate overlay pixmap"))?;
    resvg::render(&tree, resvg::tiny_skia::Transform::identity(), &mut pixmap.as_mut());

    Ok(FrameRGBA {
        width,
        height,
        data: pixmap.take(),
        premultiplied: true,
    })
}

/// Draws the overlay layers over a post-processed scene frame.
#[derive(Clone, Debug)]
pub struct Overlay {
    layout: UiLayout,
    title: TitleDef,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl Overlay {
    pub fn new(layout: UiLayout, title: TitleDef, fontdb: Arc<usvg::fontdb::Database>) -> Self {
        Self {
            layout,
            title,
            fontdb,
        }
    }

    pub fn layout(&self) -> &UiLayout {
        &self.layout
    }

    /// UI first, then the video overlay on top of everything.
    pub fn compose(
        &self,
        frame: &mut FrameRGBA,
        state: &FrameState,
        video_frame: Option<&FrameRGBA>,
    ) -> CardResult<()> {
        let ui = rasterize_svg(&ui_svg(&self.layout, &self.title, state), &self.fontdb)?;
        over_in_place(frame, &ui, 1.0)?;

        let Some(video) = &state.video else {
            return Ok(());
        };
        fill_over(frame, [0, 0, 0], video.backdrop_opacity);

        let bounds = Rect::new(0.0, 0.0, f64::from(frame.width), f64::from(frame.height));
        let c = bounds.center().to_vec2();
        let zoom =
            Affine::translate(c) * Affine::scale(f64::from(video.zoom)) * Affine::translate(-c);

        if let Some(vf) = video_frame {
            let fit = contain_rect(vf.width, vf.height, bounds);
            let place = Affine::translate(fit.origin().to_vec2())
                * Affine::scale(fit.width() / f64::from(vf.width.max(1)));
            draw_image(frame, vf, zoom * place, video.opacity)?;
        }

        let chrome = rasterize_svg(&close_button_svg(&self.layout), &self.fontdb)?;
        draw_image(frame, &chrome, zoom, video.opacity)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/overlay.rs"]
mod tests;
