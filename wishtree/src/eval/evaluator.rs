use std::f64::consts::TAU;

use crate::{
    animation::bezier::cubic_bezier,
    animation::ease::Ease,
    animation::sequence::Track,
    choreo::choreography::Choreography,
    choreo::music::MusicState,
    foundation::core::{Fps, FrameIndex, Vec3},
    foundation::error::{CardError, CardResult},
    lyrics::sheet::LyricSheet,
    particles::fields::TOPPER_POSITION,
    store::card_store::CardStore,
};

/// Scene group spin around +Y.
pub const SCENE_SPIN_RAD_PER_SEC: f64 = 0.05;
/// Camera auto-orbit speed (one turn every 120 s).
pub const CAMERA_ORBIT_RAD_PER_SEC: f64 = TAU / 60.0 * 0.5;
/// Wish cluster spin around its own +Y axis.
pub const WISH_SPIN_RAD_PER_SEC: f64 = 6.0;
pub const WISH_START: Vec3 = Vec3::new(0.0, -6.0, 5.0);
pub const WISH_CONTROL_1: Vec3 = Vec3::new(2.0, 0.0, 2.0);
pub const WISH_CONTROL_2: Vec3 = Vec3::new(-1.0, 3.0, 1.0);

const BACKDROP_FADE_SECS: f64 = 1.0;
const VIDEO_ZOOM_SECS: f64 = 0.8;
const VIDEO_ZOOM_EASE: Ease = Ease::CubicBezier(0.16, 1.0, 0.3, 1.0);

/// Everything the renderer needs to draw one frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FrameState {
    pub frame: FrameIndex,
    /// Card time in seconds.
    pub time: f64,
    pub store: CardStore,
    /// Rotation of the tree/topper/rings group around +Y.
    pub scene_rotation: f32,
    /// Camera azimuth offset from its configured position (negative is clockwise from above).
    pub camera_azimuth: f32,
    /// Eased tree boost uniform.
    pub tree_boost: f32,
    pub wish: Option<WishState>,
    pub surprise: Option<SurpriseState>,
    pub video: Option<VideoState>,
    pub music: MusicView,
    pub wish_box: WishBoxView,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct WishState {
    /// Index of the accepted wish, used to key its burst offsets.
    pub index: usize,
    pub position: Vec3,
    pub scale: f32,
    pub spin: f32,
    /// Particle travel along the burst offsets, `[0, 1]`.
    pub burst: f32,
    pub opacity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct SurpriseState {
    pub opacity: f32,
    pub boost: f32,
    pub explosion: f32,
    pub rotation: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct VideoState {
    /// Seconds since the overlay opened.
    pub local_time: f64,
    pub backdrop_opacity: f32,
    /// Scale of the video frame around the canvas centre.
    pub zoom: f32,
    pub opacity: f32,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MusicView {
    pub state: MusicState,
    /// Song position in seconds.
    pub position: f64,
    /// Active lyric line, only while playing.
    pub lyric: Option<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct WishBoxView {
    pub text: String,
    /// Send button is dimmed.
    pub send_disabled: bool,
}

/// Pure per-frame evaluator over a compiled choreography.
#[derive(Clone, Debug)]
pub struct Evaluator {
    choreo: Choreography,
    lyrics: LyricSheet,
    fps: Fps,
    duration_frames: u64,
    auto_rotate: bool,
}

impl Evaluator {
    pub fn new(
        choreo: Choreography,
        lyrics: LyricSheet,
        fps: Fps,
        duration_frames: u64,
        auto_rotate: bool,
    ) -> Self {
        Self {
            choreo,
            lyrics,
            fps,
            duration_frames,
            auto_rotate,
        }
    }

    pub fn choreography(&self) -> &Choreography {
        &self.choreo
    }

    pub fn lyrics(&self) -> &LyricSheet {
        &self.lyrics
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub fn eval_frame(&self, frame: FrameIndex) -> CardResult<FrameState> {
        if frame.0 >= self.duration_frames {
            return Err(CardError::evaluation(format!(
                "frame {} is outside the card duration ({} frames)",
                frame.0, self.duration_frames
            )));
        }
        let mut state = self.eval_time(self.fps.frames_to_secs(frame.0));
        state.frame = frame;
        Ok(state)
    }

    /// Evaluate at an arbitrary card time. `frame` is set to the frame containing `t`.
    pub fn eval_time(&self, t: f64) -> FrameState {
        let t = t.max(0.0);
        let store = self.choreo.store_at(t);
        let camera_azimuth = if self.auto_rotate {
            -(CAMERA_ORBIT_RAD_PER_SEC * t) as f32
        } else {
            0.0
        };

        FrameState {
            frame: FrameIndex(self.fps.secs_to_frames_floor(t)),
            time: t,
            store,
            scene_rotation: (SCENE_SPIN_RAD_PER_SEC * t) as f32,
            camera_azimuth,
            tree_boost: self.choreo.smoothed_boost_at(t) as f32,
            wish: self.wish(t),
            surprise: self.surprise(t),
            video: self.video(t),
            music: self.music(t),
            wish_box: {
                let text = self.choreo.wish_box_at(t).to_owned();
                WishBoxView {
                    send_disabled: store.is_wishing || text.trim().is_empty(),
                    text,
                }
            },
        }
    }

    fn wish(&self, t: f64) -> Option<WishState> {
        let tl = self.choreo.timelines();
        let (index, ep) = self.choreo.wish_at(t)?;

        let local = t - ep.sent_at;
        let progress = tl.wish_flight.sample(Track::Progress, local) as f32;
        let scale = tl.wish_flight.sample(Track::Scale, local) as f32;
        let (burst, opacity) = if t >= ep.burst_at {
            let b = t - ep.burst_at;
            (
                tl.wish_burst.sample(Track::Burst, b) as f32,
                tl.wish_burst.sample(Track::Opacity, b) as f32,
            )
        } else {
            (0.0, 1.0)
        };

        Some(WishState {
            index,
            position: cubic_bezier(
                progress,
                WISH_START,
                WISH_CONTROL_1,
                WISH_CONTROL_2,
                TOPPER_POSITION,
            ),
            scale,
            spin: (WISH_SPIN_RAD_PER_SEC * local) as f32,
            burst,
            opacity,
        })
    }

    fn surprise(&self, t: f64) -> Option<SurpriseState> {
        let ep = self.choreo.surprise_at(t)?;
        let tl = &self.choreo.timelines().surprise;
        let local = t - ep.start;
        Some(SurpriseState {
            opacity: tl.sample(Track::Opacity, local) as f32,
            boost: tl.sample(Track::Boost, local) as f32,
            explosion: tl.sample(Track::Explosion, local) as f32,
            rotation: ((t * 0.5).sin() * 0.2) as f32,
        })
    }

    fn video(&self, t: f64) -> Option<VideoState> {
        let ep = self.choreo.video_at(t)?;
        let local = t - ep.start;
        let zoom = VIDEO_ZOOM_EASE.apply(local / VIDEO_ZOOM_SECS) as f32;
        Some(VideoState {
            local_time: local,
            backdrop_opacity: Ease::CSS_EASE_OUT.apply(local / BACKDROP_FADE_SECS) as f32,
            zoom,
            opacity: zoom,
        })
    }

    fn music(&self, t: f64) -> MusicView {
        let music = &self.choreo.music;
        let state = music.state_at(t);
        let position = music.position_at(t);
        let lyric = (state == MusicState::Playing)
            .then(|| self.lyrics.line_at(position))
            .flatten()
            .map(|l| l.text.clone());
        MusicView {
            state,
            position,
            lyric,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/evaluator.rs"]
mod tests;
