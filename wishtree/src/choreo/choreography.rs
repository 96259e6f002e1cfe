use crate::{
    card::model::Card,
    card::script::CueAction,
    choreo::music::{MusicPlayer, MusicTimeline},
    choreo::queue::EventQueue,
    choreo::timelines::{BOOST_HOLD_SECS, Timelines},
    foundation::error::CardResult,
    store::card_store::CardStore,
};

/// What the choreography needs to know about the card's media, probed up front.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MediaInfo {
    /// Song length in seconds, `None` when the song is missing or undecodable.
    pub song_duration: Option<f64>,
    /// Video length in seconds, `None` when the video is missing or undecodable.
    pub video_duration: Option<f64>,
}

/// An accepted wish: typing, send, flight, burst.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct WishEpisode {
    pub text: String,
    pub sent_at: f64,
    /// Flight ends and the burst begins.
    pub burst_at: f64,
    /// Burst ends and the store leaves the wishing state.
    pub end_at: f64,
}

/// Text sitting in the wish box over a span of card time.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct WishBoxSpan {
    pub from: f64,
    /// `None` when the text is never cleared.
    pub to: Option<f64>,
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct SurpriseEpisode {
    pub start: f64,
    /// The video replaces the heart at this time.
    pub video_at: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct VideoEpisode {
    pub start: f64,
    pub end: f64,
    /// `false` when the overlay closed immediately because the video could not be played.
    pub playable: bool,
}

/// Tree boost target change made by a store action.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct BoostChange {
    pub at: f64,
    pub target: f64,
}

/// A cue the interaction layer refused.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct IgnoredCue {
    pub at: f64,
    pub action: &'static str,
    pub reason: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct StoreSnapshot {
    pub at: f64,
    pub store: CardStore,
}

/// Everything that happens over a card's lifetime, resolved against its script and media.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Choreography {
    #[serde(skip)]
    timelines: Timelines,
    pub duration_secs: f64,
    pub wishes: Vec<WishEpisode>,
    pub wish_box: Vec<WishBoxSpan>,
    pub surprises: Vec<SurpriseEpisode>,
    pub videos: Vec<VideoEpisode>,
    pub boost_changes: Vec<BoostChange>,
    pub music: MusicTimeline,
    pub ignored: Vec<IgnoredCue>,
    /// Store state after every action, in time order.
    pub store_changes: Vec<StoreSnapshot>,
}

#[derive(Clone, Copy, Debug)]
enum Event {
    Cue(usize),
    FlightEnd,
    BoostReset,
    WishEnd,
    StartVideo,
    VideoEnd(usize),
}

impl Choreography {
    /// Run the card's script through the store in time order.
    #[tracing::instrument(skip_all, fields(cues = card.script.len()))]
    pub fn compile(card: &Card, media: &MediaInfo) -> CardResult<Self> {
        let timelines = Timelines::build()?;
        let mut sim = Sim {
            store: CardStore::new(),
            queue: EventQueue::new(),
            music: MusicPlayer::new(media.song_duration),
            out: Choreography {
                timelines,
                duration_secs: card.duration_secs(),
                wishes: Vec::new(),
                wish_box: Vec::new(),
                surprises: Vec::new(),
                videos: Vec::new(),
                boost_changes: Vec::new(),
                music: MusicTimeline {
                    song_duration: None,
                    changes: Vec::new(),
                    intervals: Vec::new(),
                },
                ignored: Vec::new(),
                store_changes: Vec::new(),
            },
        };

        for (i, cue) in card.script.iter().enumerate() {
            sim.queue.push(cue.at, Event::Cue(i));
        }

        while let Some((at, event)) = sim.queue.pop() {
            match event {
                Event::Cue(i) => sim.cue(card, i, at),
                Event::FlightEnd => sim.burst(at),
                Event::BoostReset => {
                    sim.store.set_tree_boost(0.0);
                    sim.boost(at, 0.0);
                    sim.snapshot(at);
                }
                Event::WishEnd => {
                    sim.store.end_wish();
                    sim.snapshot(at);
                }
                Event::StartVideo => sim.start_video(at, media),
                Event::VideoEnd(id) => sim.end_video(at, id),
            }
        }

        let Sim { music, mut out, .. } = sim;
        out.music = music.finish(out.duration_secs);
        tracing::debug!(
            wishes = out.wishes.len(),
            surprises = out.surprises.len(),
            ignored = out.ignored.len(),
            "choreography compiled"
        );
        Ok(out)
    }

    pub fn timelines(&self) -> &Timelines {
        &self.timelines
    }

    /// Store state at card time `t`, with actions at exactly `t` applied.
    pub fn store_at(&self, t: f64) -> CardStore {
        let idx = self.store_changes.partition_point(|s| s.at <= t);
        idx.checked_sub(1)
            .map(|i| self.store_changes[i].store)
            .unwrap_or_default()
    }

    /// The wish whose flight or burst covers `t`, with its index among accepted wishes.
    pub fn wish_at(&self, t: f64) -> Option<(usize, &WishEpisode)> {
        self.wishes
            .iter()
            .enumerate()
            .find(|(_, w)| w.sent_at <= t && t < w.end_at)
    }

    /// The surprise heart visible at `t`.
    pub fn surprise_at(&self, t: f64) -> Option<&SurpriseEpisode> {
        self.surprises
            .iter()
            .find(|s| s.start <= t && t < s.video_at)
    }

    pub fn video_at(&self, t: f64) -> Option<&VideoEpisode> {
        self.videos.iter().find(|v| v.start <= t && t < v.end)
    }

    /// Text in the wish box at `t` (empty when nothing is typed).
    pub fn wish_box_at(&self, t: f64) -> &str {
        self.wish_box
            .iter()
            .rev()
            .find(|s| s.from <= t && s.to.is_none_or(|to| t < to))
            .map(|s| s.text.as_str())
            .unwrap_or("")
    }

    /// Eased tree boost at `t`.
    ///
    /// The displayed boost chases the store's target exponentially, closing 10% of the gap per
    /// 1/60 s.
    pub fn smoothed_boost_at(&self, t: f64) -> f64 {
        let mut value = 0.0;
        let mut target = 0.0;
        let mut last = 0.0;
        for change in self.boost_changes.iter().take_while(|c| c.at <= t) {
            value = approach(value, target, change.at - last);
            target = change.target;
            last = change.at;
        }
        approach(value, target, t - last)
    }
}

fn approach(value: f64, target: f64, dt: f64) -> f64 {
    target + (value - target) * 0.9f64.powf(60.0 * dt.max(0.0))
}

struct Sim {
    store: CardStore,
    queue: EventQueue<Event>,
    music: MusicPlayer,
    out: Choreography,
}

impl Sim {
    fn cue(&mut self, card: &Card, i: usize, at: f64) {
        let cue = &card.script[i];
        match &cue.action {
            CueAction::ToggleMusic => {
                if self.store.is_video_playing {
                    self.ignore(at, cue.action.name(), "video overlay covers the music button");
                    return;
                }
                self.music.toggle(at);
            }
            CueAction::Wish { text, .. } => self.wish(at, cue.type_secs(), text),
            CueAction::TapTree => {
                if self.store.is_video_playing || self.store.show_surprise {
                    self.ignore(at, cue.action.name(), "surprise already running");
                    return;
                }
                self.store.trigger_surprise();
                let video_at = at + self.out.timelines.video_at();
                self.out.surprises.push(SurpriseEpisode {
                    start: at,
                    video_at,
                });
                self.queue.push(video_at, Event::StartVideo);
                self.snapshot(at);
            }
            CueAction::CloseVideo => {
                if !self.store.is_video_playing {
                    self.ignore(at, cue.action.name(), "no video playing");
                    return;
                }
                let id = self.out.videos.len().saturating_sub(1);
                self.end_video(at, id);
            }
        }
    }

    fn wish(&mut self, at: f64, type_secs: f64, text: &str) {
        let from = (at - type_secs).max(0.0);
        if let Some(prev) = self.out.wish_box.last_mut()
            && prev.to.is_none_or(|to| to > from)
        {
            prev.to = Some(from.max(prev.from));
        }

        let blocked = if text.trim().is_empty() {
            Some("wish text is empty")
        } else if self.store.is_wishing {
            Some("a wish is already in flight")
        } else if self.store.is_video_playing {
            Some("video overlay covers the wish box")
        } else {
            None
        };

        if let Some(reason) = blocked {
            self.out.wish_box.push(WishBoxSpan {
                from,
                to: None,
                text: text.to_owned(),
            });
            self.ignore(at, "wish", reason);
            return;
        }

        self.out.wish_box.push(WishBoxSpan {
            from,
            to: Some(at),
            text: text.to_owned(),
        });
        self.store.start_wish(text);
        let burst_at = at + self.out.timelines.flight_secs();
        let end_at = burst_at + self.out.timelines.burst_secs();
        self.out.wishes.push(WishEpisode {
            text: text.to_owned(),
            sent_at: at,
            burst_at,
            end_at,
        });
        self.queue.push(burst_at, Event::FlightEnd);
        self.snapshot(at);
    }

    fn burst(&mut self, at: f64) {
        self.store.set_tree_boost(1.0);
        self.boost(at, 1.0);
        self.queue.push(at + BOOST_HOLD_SECS, Event::BoostReset);
        self.queue
            .push(at + self.out.timelines.burst_secs(), Event::WishEnd);
        self.snapshot(at);
    }

    fn start_video(&mut self, at: f64, media: &MediaInfo) {
        self.store.start_video();
        let id = self.out.videos.len();
        match media.video_duration {
            Some(dur) => {
                self.out.videos.push(VideoEpisode {
                    start: at,
                    end: at + dur.max(0.0),
                    playable: true,
                });
                self.queue.push(at + dur.max(0.0), Event::VideoEnd(id));
                self.snapshot(at);
            }
            None => {
                tracing::warn!(at, "video unavailable; closing overlay");
                self.out.videos.push(VideoEpisode {
                    start: at,
                    end: at,
                    playable: false,
                });
                self.snapshot(at);
                self.end_video(at, id);
            }
        }
    }

    fn end_video(&mut self, at: f64, id: usize) {
        // Stale end events from a closed episode are ignored.
        if id + 1 != self.out.videos.len() || !self.store.is_video_playing {
            return;
        }
        if let Some(ep) = self.out.videos.last_mut() {
            ep.end = ep.end.min(at);
        }
        self.store.end_video();
        self.snapshot(at);
    }

    fn boost(&mut self, at: f64, target: f64) {
        self.out.boost_changes.push(BoostChange { at, target });
    }

    fn ignore(&mut self, at: f64, action: &'static str, reason: &'static str) {
        tracing::debug!(at, action, reason, "cue ignored");
        self.out.ignored.push(IgnoredCue { at, action, reason });
    }

    fn snapshot(&mut self, at: f64) {
        self.out.store_changes.push(StoreSnapshot {
            at,
            store: self.store,
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/choreo/choreography.rs"]
mod tests;
