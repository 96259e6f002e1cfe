use crate::{
    animation::ease::Ease,
    animation::sequence::{Sequence, Timeline, Track},
    foundation::error::CardResult,
};

/// Delay between the explosion starting and the video overlay appearing.
pub const VIDEO_DELAY_SECS: f64 = 0.15;
/// How long the tree stays boosted after a wish lands.
pub const BOOST_HOLD_SECS: f64 = 1.0;

/// The scripted one-shot animations, built once per choreography.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Timelines {
    /// Wish cluster flight: `Progress` along the path and group `Scale`.
    pub wish_flight: Timeline,
    /// Wish cluster burst: `Opacity` fade and particle `Burst` travel.
    pub wish_burst: Timeline,
    /// Surprise heart: `Opacity`, `Boost` and `Explosion`.
    pub surprise: Timeline,
    /// Surprise-local time at which the explosion starts.
    pub explosion_at: f64,
}

impl Timelines {
    pub fn build() -> CardResult<Self> {
        let mut flight = Sequence::new();
        flight
            .set(Track::Scale, 1.0)
            .to(Track::Progress, 1.0, 2.5, Ease::InOutQuart)
            .with(Track::Scale, 0.5, 2.5, Ease::OutQuad);

        let mut burst = Sequence::new();
        burst
            .set(Track::Opacity, 1.0)
            .to(Track::Opacity, 0.0, 1.0, Ease::OutCubic)
            .with(Track::Burst, 1.0, 1.0, Ease::OutCubic);

        let mut surprise = Sequence::new();
        surprise
            .set(Track::Boost, 2.0)
            .to(Track::Opacity, 1.0, 1.0, Ease::OutCubic)
            .pause(1.5)
            .to(Track::Boost, 8.0, 0.5, Ease::InCubic);
        let explosion_at = surprise.mark();
        surprise.to(Track::Explosion, 1.0, 0.8, Ease::OutExpo);

        Ok(Self {
            wish_flight: flight.build()?,
            wish_burst: burst.build()?,
            surprise: surprise.build()?,
            explosion_at,
        })
    }

    pub fn flight_secs(&self) -> f64 {
        self.wish_flight.duration()
    }

    pub fn burst_secs(&self) -> f64 {
        self.wish_burst.duration()
    }

    /// Surprise-local time at which the video starts.
    pub fn video_at(&self) -> f64 {
        self.explosion_at + VIDEO_DELAY_SECS
    }
}

#[cfg(test)]
#[path = "../../tests/unit/choreo/timelines.rs"]
mod tests;
