//! Wishtree renders an animated particle greeting card, deterministically and offline.
//!
//! A card is a JSON document: canvas, timing, song and video assets, scene knobs and a timed
//! interaction script standing in for clicks and key presses. The public API is
//! session-oriented:
//!
//! - Load and validate a [`Card`]
//! - Create a [`RenderSession`] (probes media, compiles the [`Choreography`], builds particles)
//! - Render single frames or stream a range into a [`FrameSink`]
#![forbid(unsafe_code)]

mod foundation;

pub mod animation;
pub mod audio;
pub mod card;
pub mod choreo;
/// Encoding sinks.
pub mod encode;
pub mod eval;
pub mod lyrics;
pub mod media;
pub mod particles;
/// CPU point-splatting renderer, post chain and UI overlay.
pub mod render;
/// Session-oriented rendering API.
pub mod session;
pub mod store;

pub use crate::foundation::core::{
    Affine, Canvas, Fps, FrameIndex, FrameRange, Point, Rect, Rgb, Vec2, Vec3,
};
pub use crate::foundation::error::{CardError, CardResult};
pub use crate::foundation::math::{Rng64, hash01};

pub use crate::card::model::{Card, SceneDef, SongDef, TitleDef, VideoDef};
pub use crate::card::script::{Cue, CueAction};
pub use crate::choreo::choreography::{Choreography, MediaInfo};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::png::{PngSequenceSink, write_png};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::eval::evaluator::{Evaluator, FrameState};
pub use crate::lyrics::sheet::{LyricLine, LyricSheet, parse_lyrics};
pub use crate::render::cpu::RenderSettings;
pub use crate::render::frame::FrameRGBA;
pub use crate::session::render_session::{RenderSession, RenderSessionOpts, RenderStats};
pub use crate::store::card_store::CardStore;
