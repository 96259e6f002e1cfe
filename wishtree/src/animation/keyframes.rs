use crate::{
    animation::ease::Ease,
    foundation::error::{CardError, CardResult},
};

/// Interpolation contract for animated value types.
pub trait Lerp: Sized {
    /// Interpolate from `a` to `b` with normalized factor `t` in `[0, 1]`.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// One keyframe on a seconds-based track.
pub struct Keyframe<T> {
    /// Track-local time in seconds.
    pub at: f64,
    /// Value at `at`.
    pub value: T,
    /// Easing applied toward the next keyframe.
    pub ease: Ease,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Keyframed track with a fallback value for empty tracks.
pub struct Keyframes<T> {
    /// Keyframes sorted by `at`.
    pub keys: Vec<Keyframe<T>>,
    /// Value used when `keys` is empty.
    pub default: T,
}

impl<T> Keyframes<T>
where
    T: Lerp + Clone,
{
    pub fn constant(value: T) -> Self {
        Self {
            keys: Vec::new(),
            default: value,
        }
    }

    /// Validate key ordering and finiteness.
    pub fn validate(&self) -> CardResult<()> {
        if self.keys.iter().any(|k| !k.at.is_finite()) {
            return Err(CardError::animation("keyframe times must be finite"));
        }
        if !self.keys.windows(2).all(|w| w[0].at <= w[1].at) {
            return Err(CardError::animation("keyframes must be sorted by time"));
        }
        Ok(())
    }

    /// Last key value, or the default for an empty track.
    pub fn last_value(&self) -> T {
        self.keys
            .last()
            .map(|k| k.value.clone())
            .unwrap_or_else(|| self.default.clone())
    }

    /// End time of the track (0 for an empty track).
    pub fn end(&self) -> f64 {
        self.keys.last().map(|k| k.at).unwrap_or(0.0)
    }

    /// Sample at track-local time `t`, holding the first/last value outside the keyed range.
    pub fn sample(&self, t: f64) -> T {
        if self.keys.is_empty() {
            return self.default.clone();
        }

        let idx = self.keys.partition_point(|k| k.at <= t);
        if idx == 0 {
            return self.keys[0].value.clone();
        }
        if idx >= self.keys.len() {
            return self.keys[self.keys.len() - 1].value.clone();
        }

        let a = &self.keys[idx - 1];
        let b = &self.keys[idx];
        let denom = b.at - a.at;
        if denom <= 0.0 {
            return a.value.clone();
        }

        let te = a.ease.apply((t - a.at) / denom);
        T::lerp(&a.value, &b.value, te)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/keyframes.rs"]
mod tests;
