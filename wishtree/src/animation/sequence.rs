use std::collections::BTreeMap;

use crate::{
    animation::ease::Ease,
    animation::keyframes::{Keyframe, Keyframes},
    foundation::error::{CardError, CardResult},
};

/// Properties a timeline sequence can drive.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Track {
    /// Material opacity.
    Opacity,
    /// Boost uniform.
    Boost,
    /// Explosion uniform.
    Explosion,
    /// Normalized progress along a flight path.
    Progress,
    /// Uniform group scale.
    Scale,
    /// Normalized burst travel of individual particles.
    Burst,
}

/// Builder for an ordered list of tweens played once from `t = 0`.
///
/// `to` tweens a track from whatever value it holds at the cursor and advances the cursor;
/// `with` does the same without advancing it, so the tween runs alongside the previous one.
#[derive(Debug, Default)]
pub struct Sequence {
    cursor: f64,
    last_start: f64,
    tracks: BTreeMap<Track, Keyframes<f64>>,
    error: Option<CardError>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current insertion time in seconds.
    pub fn mark(&self) -> f64 {
        self.cursor
    }

    /// Pin `track` to `value` at the cursor.
    pub fn set(&mut self, track: Track, value: f64) -> &mut Self {
        let at = self.cursor;
        self.track_mut(track).keys.push(Keyframe {
            at,
            value,
            ease: Ease::Linear,
        });
        self
    }

    /// Tween `track` to `target` over `duration` seconds starting at the cursor.
    pub fn to(&mut self, track: Track, target: f64, duration: f64, ease: Ease) -> &mut Self {
        let start = self.cursor;
        self.push_tween(track, target, start, duration, ease);
        self.last_start = start;
        if duration.is_finite() && duration > 0.0 {
            self.cursor = start + duration;
        }
        self
    }

    /// Tween `track` in parallel with the previous `to`, starting at the same time.
    pub fn with(&mut self, track: Track, target: f64, duration: f64, ease: Ease) -> &mut Self {
        let start = self.last_start;
        self.push_tween(track, target, start, duration, ease);
        self.cursor = self.cursor.max(start + duration.max(0.0));
        self
    }

    /// Advance the cursor without animating anything.
    pub fn pause(&mut self, duration: f64) -> &mut Self {
        if !duration.is_finite() || duration < 0.0 {
            self.fail(CardError::animation("pause duration must be >= 0"));
            return self;
        }
        self.cursor += duration;
        self
    }

    pub fn build(&mut self) -> CardResult<Timeline> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        for kf in self.tracks.values() {
            kf.validate()?;
        }
        Ok(Timeline {
            tracks: std::mem::take(&mut self.tracks),
            duration: self.cursor,
        })
    }

    fn push_tween(&mut self, track: Track, target: f64, start: f64, duration: f64, ease: Ease) {
        if !duration.is_finite() || duration < 0.0 {
            self.fail(CardError::animation("tween duration must be >= 0"));
            return;
        }
        if start < self.track_mut(track).end() {
            self.fail(CardError::animation(format!(
                "tween on {track:?} overlaps an earlier tween"
            )));
            return;
        }
        let kf = self.track_mut(track);
        let from = kf.last_value();
        kf.keys.push(Keyframe {
            at: start,
            value: from,
            ease,
        });
        kf.keys.push(Keyframe {
            at: start + duration,
            value: target,
            ease: Ease::Linear,
        });
    }

    // First error wins; later ones are usually consequences of it.
    fn fail(&mut self, err: CardError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn track_mut(&mut self, track: Track) -> &mut Keyframes<f64> {
        self.tracks
            .entry(track)
            .or_insert_with(|| Keyframes::constant(0.0))
    }
}

/// A built sequence: per-track keyframes plus the total length.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Timeline {
    tracks: BTreeMap<Track, Keyframes<f64>>,
    duration: f64,
}

impl Timeline {
    /// Total length in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Sample `track` at sequence-local time `t`. Untouched tracks read as 0.
    pub fn sample(&self, track: Track, t: f64) -> f64 {
        self.tracks.get(&track).map(|kf| kf.sample(t)).unwrap_or(0.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/sequence.rs"]
mod tests;
