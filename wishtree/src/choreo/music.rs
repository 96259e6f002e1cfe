/// Music button / player state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MusicState {
    Paused,
    Playing,
    /// The song could not be loaded.
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MusicChange {
    pub at: f64,
    pub state: MusicState,
}

/// A stretch of card time during which the song plays.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlayInterval {
    pub start: f64,
    pub end: f64,
    /// Song position (seconds, already wrapped) at `start`.
    pub offset: f64,
}

/// Looping song playback over card time.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MusicTimeline {
    pub song_duration: Option<f64>,
    /// State changes in time order, starting with the state at `t = 0`.
    pub changes: Vec<MusicChange>,
    pub intervals: Vec<PlayInterval>,
}

impl MusicTimeline {
    pub fn state_at(&self, t: f64) -> MusicState {
        let idx = self.changes.partition_point(|c| c.at <= t);
        idx.checked_sub(1)
            .map(|i| self.changes[i].state)
            .unwrap_or(MusicState::Paused)
    }

    /// Song position at card time `t`. Holds while paused and wraps at the song's end.
    pub fn position_at(&self, t: f64) -> f64 {
        let Some(dur) = self.song_duration.filter(|d| *d > 0.0) else {
            return 0.0;
        };
        let idx = self.intervals.partition_point(|iv| iv.start <= t);
        let Some(iv) = idx.checked_sub(1).map(|i| self.intervals[i]) else {
            return 0.0;
        };
        let played = t.min(iv.end) - iv.start;
        (iv.offset + played).rem_euclid(dur)
    }
}

/// Incremental builder driven by the choreography's event loop.
#[derive(Debug)]
pub(crate) struct MusicPlayer {
    song_duration: Option<f64>,
    state: MusicState,
    played: f64,
    open_since: Option<f64>,
    changes: Vec<MusicChange>,
    intervals: Vec<PlayInterval>,
}

impl MusicPlayer {
    pub(crate) fn new(song_duration: Option<f64>) -> Self {
        let state = if song_duration.is_some() {
            MusicState::Paused
        } else {
            tracing::warn!("song unavailable; music player starts in error state");
            MusicState::Error
        };
        Self {
            song_duration,
            state,
            played: 0.0,
            open_since: None,
            changes: vec![MusicChange { at: 0.0, state }],
            intervals: Vec::new(),
        }
    }

    pub(crate) fn toggle(&mut self, at: f64) {
        match self.state {
            // Media availability is fixed per render.
            MusicState::Error => tracing::warn!(at, "song still unavailable"),
            MusicState::Playing => {
                self.close(at);
                self.set(at, MusicState::Paused);
            }
            MusicState::Paused => {
                self.open_since = Some(at);
                self.set(at, MusicState::Playing);
            }
        }
    }

    pub(crate) fn finish(mut self, end: f64) -> MusicTimeline {
        if let Some(start) = self.open_since {
            self.close(end.max(start));
        }
        MusicTimeline {
            song_duration: self.song_duration,
            changes: self.changes,
            intervals: self.intervals,
        }
    }

    fn close(&mut self, at: f64) {
        let Some(start) = self.open_since.take() else {
            return;
        };
        let dur = self.song_duration.unwrap_or(0.0);
        let offset = if dur > 0.0 {
            self.played.rem_euclid(dur)
        } else {
            0.0
        };
        self.intervals.push(PlayInterval {
            start,
            end: at,
            offset,
        });
        self.played += at - start;
    }

    fn set(&mut self, at: f64, state: MusicState) {
        self.state = state;
        self.changes.push(MusicChange { at, state });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/choreo/music.rs"]
mod tests;
