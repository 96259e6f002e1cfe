use super::*;
use crate::card::script::Cue;
use crate::choreo::music::MusicState;

fn card_with(script: Vec<Cue>) -> Card {
    let mut card = Card::from_reader(
        r#"{"canvas": {"width": 64, "height": 64}, "fps": {"num": 30, "den": 1}, "duration": 900}"#
            .as_bytes(),
    )
    .unwrap();
    card.script = script;
    card
}

fn cue(at: f64, action: CueAction) -> Cue {
    Cue { at, action }
}

fn wish(at: f64, text: &str) -> Cue {
    cue(
        at,
        CueAction::Wish {
            text: text.to_owned(),
            type_secs: Some(1.0),
        },
    )
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn media(video: Option<f64>) -> MediaInfo {
    MediaInfo {
        song_duration: Some(60.0),
        video_duration: video,
    }
}

#[test]
fn wish_runs_flight_burst_and_boost() {
    let c = Choreography::compile(&card_with(vec![wish(2.0, "a quiet year")]), &media(None))
        .unwrap();

    assert_eq!(c.wishes.len(), 1);
    let w = &c.wishes[0];
    assert_eq!(w.sent_at, 2.0);
    assert_eq!(w.burst_at, 4.5);
    assert_eq!(w.end_at, 5.5);

    assert!(!c.store_at(1.9).is_wishing);
    assert!(c.store_at(2.0).is_wishing);
    assert!(c.store_at(5.4).is_wishing);
    assert!(!c.store_at(5.5).is_wishing);

    assert_eq!(c.store_at(4.4).tree_boost_intensity, 0.0);
    assert_eq!(c.store_at(4.5).tree_boost_intensity, 1.0);
    assert_eq!(c.store_at(5.5).tree_boost_intensity, 0.0);
    assert_eq!(
        c.boost_changes,
        vec![
            BoostChange {
                at: 4.5,
                target: 1.0
            },
            BoostChange {
                at: 5.5,
                target: 0.0
            },
        ]
    );
}

#[test]
fn wish_guard_rejects_blank_and_overlapping_wishes() {
    let c = Choreography::compile(
        &card_with(vec![
            wish(1.0, "   "),
            wish(2.0, "first"),
            wish(3.0, "too soon"),
            wish(6.0, "second"),
        ]),
        &media(None),
    )
    .unwrap();

    let texts: Vec<&str> = c.wishes.iter().map(|w| w.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
    let reasons: Vec<&str> = c.ignored.iter().map(|i| i.reason).collect();
    assert_eq!(
        reasons,
        vec!["wish text is empty", "a wish is already in flight"]
    );
}

#[test]
fn wish_box_shows_typing_then_clears_on_send() {
    let c = Choreography::compile(
        &card_with(vec![
            wish(2.0, "first"),
            wish(3.5, "rejected"),
            wish(8.0, "later"),
        ]),
        &media(None),
    )
    .unwrap();
    assert_eq!(c.wish_box_at(0.5), "");
    assert_eq!(c.wish_box_at(1.5), "first");
    assert_eq!(c.wish_box_at(2.0), "");
    // The refused text stays until the next wish is typed over it.
    assert_eq!(c.wish_box_at(2.5), "rejected");
    assert_eq!(c.wish_box_at(6.9), "rejected");
    assert_eq!(c.wish_box_at(7.5), "later");
    assert_eq!(c.wish_box_at(8.5), "");
}

#[test]
fn tap_tree_runs_surprise_then_video() {
    let c = Choreography::compile(
        &card_with(vec![cue(1.0, CueAction::TapTree)]),
        &media(Some(5.0)),
    )
    .unwrap();

    assert_eq!(c.surprises.len(), 1);
    assert_eq!(c.surprises[0].start, 1.0);
    assert!(approx(c.surprises[0].video_at, 4.15));
    assert!(c.store_at(2.0).show_surprise);
    let at_video = c.store_at(4.2);
    assert!(at_video.is_video_playing);
    assert!(!at_video.show_surprise);
    assert!(approx(c.videos[0].end, 9.15));
    assert!(c.videos[0].playable);
    assert!(c.store_at(9.1).is_video_playing);
    assert!(!c.store_at(9.2).is_video_playing);
    assert!(c.surprise_at(4.0).is_some());
    assert!(c.surprise_at(4.2).is_none());
    assert!(c.video_at(5.0).is_some());
}

#[test]
fn tap_guard_blocks_during_surprise_and_video() {
    let c = Choreography::compile(
        &card_with(vec![
            cue(1.0, CueAction::TapTree),
            cue(2.0, CueAction::TapTree),
            cue(6.0, CueAction::TapTree),
            cue(20.0, CueAction::TapTree),
        ]),
        &media(Some(5.0)),
    )
    .unwrap();
    assert_eq!(c.surprises.len(), 2);
    assert_eq!(c.surprises[1].start, 20.0);
    assert_eq!(c.ignored.len(), 2);
}

#[test]
fn close_video_ends_early_and_stale_end_is_ignored() {
    let c = Choreography::compile(
        &card_with(vec![
            cue(0.0, CueAction::TapTree),
            cue(5.0, CueAction::CloseVideo),
            cue(6.0, CueAction::TapTree),
        ]),
        &media(Some(4.0)),
    )
    .unwrap();

    assert_eq!(c.videos.len(), 2);
    assert_eq!(c.videos[0].end, 5.0);
    // First video's natural end (7.15) must not cut the second one short.
    assert!(approx(c.videos[1].start, 9.15));
    assert!(approx(c.videos[1].end, 13.15));
    assert!(c.store_at(10.0).is_video_playing);
}

#[test]
fn missing_video_closes_immediately() {
    let c = Choreography::compile(&card_with(vec![cue(0.0, CueAction::TapTree)]), &media(None))
        .unwrap();
    assert_eq!(c.videos.len(), 1);
    assert!(!c.videos[0].playable);
    assert_eq!(c.videos[0].start, c.videos[0].end);
    let s = c.store_at(3.2);
    assert!(!s.is_video_playing);
    assert!(!s.show_surprise);
    assert!(c.video_at(c.videos[0].start).is_none());
}

#[test]
fn overlay_blocks_music_and_wishes() {
    let c = Choreography::compile(
        &card_with(vec![
            cue(0.0, CueAction::TapTree),
            cue(4.0, CueAction::ToggleMusic),
            wish(4.5, "hidden"),
            cue(10.0, CueAction::ToggleMusic),
        ]),
        &media(Some(30.0)),
    )
    .unwrap();
    assert!(c.wishes.is_empty());
    assert_eq!(c.music.state_at(4.0), MusicState::Paused);
    assert_eq!(c.music.state_at(10.0), MusicState::Paused);
    assert_eq!(c.ignored.len(), 3);
}

#[test]
fn music_toggles_track_playback() {
    let c = Choreography::compile(
        &card_with(vec![
            cue(1.0, CueAction::ToggleMusic),
            cue(3.0, CueAction::ToggleMusic),
        ]),
        &media(None),
    )
    .unwrap();
    assert_eq!(c.music.state_at(2.0), MusicState::Playing);
    assert_eq!(c.music.state_at(3.0), MusicState::Paused);
    assert!((c.music.position_at(10.0) - 2.0).abs() < 1e-9);
}

#[test]
fn missing_song_is_error_state() {
    let c = Choreography::compile(
        &card_with(vec![cue(1.0, CueAction::ToggleMusic)]),
        &MediaInfo::default(),
    )
    .unwrap();
    assert_eq!(c.music.state_at(0.0), MusicState::Error);
    assert_eq!(c.music.state_at(2.0), MusicState::Error);
}

#[test]
fn smoothed_boost_chases_target() {
    let c = Choreography::compile(&card_with(vec![wish(0.0, "glow")]), &media(None)).unwrap();
    assert_eq!(c.smoothed_boost_at(2.0), 0.0);
    assert_eq!(c.smoothed_boost_at(2.5), 0.0);
    let one_frame = c.smoothed_boost_at(2.5 + 1.0 / 60.0);
    assert!((one_frame - 0.1).abs() < 1e-9);
    let settled = c.smoothed_boost_at(3.49);
    assert!(settled > 0.99 && settled < 1.0);
    // Decays back toward zero after the reset at 3.5 s.
    let decayed = c.smoothed_boost_at(3.5 + 1.0 / 60.0);
    assert!(decayed < settled);
    assert!(c.smoothed_boost_at(10.0) < 1e-6);
}

#[test]
fn compiled_choreography_serializes() {
    let c = Choreography::compile(&card_with(vec![wish(1.0, "json")]), &media(None)).unwrap();
    let v = serde_json::to_value(&c).unwrap();
    assert_eq!(v["wishes"][0]["text"], "json");
    assert!(v.get("timelines").is_none());
}
