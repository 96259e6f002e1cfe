use super::*;
use crate::card::model::Card;
use crate::card::script::{Cue, CueAction};
use crate::choreo::choreography::MediaInfo;
use crate::foundation::core::FrameIndex;

fn choreo(script: Vec<Cue>, song: Option<f64>, video: Option<f64>) -> Choreography {
    let mut card = Card::from_reader(
        r#"{"canvas": {"width": 64, "height": 64}, "fps": {"num": 30, "den": 1}, "duration": 1800}"#
            .as_bytes(),
    )
    .unwrap();
    card.script = script;
    Choreography::compile(
        &card,
        &MediaInfo {
            song_duration: song,
            video_duration: video,
        },
    )
    .unwrap()
}

fn toggle(at: f64) -> Cue {
    Cue {
        at,
        action: CueAction::ToggleMusic,
    }
}

#[test]
fn song_intervals_split_where_the_song_loops() {
    let c = choreo(vec![toggle(1.0), toggle(25.0)], Some(10.0), None);
    let plan = plan_audio(&c, 0.0, 60.0);
    let spans: Vec<(f64, f64, f64)> = plan
        .iter()
        .map(|s| (s.start_sec, s.end_sec, s.source_start_sec))
        .collect();
    assert_eq!(spans, vec![(1.0, 11.0, 0.0), (11.0, 21.0, 0.0), (21.0, 25.0, 0.0)]);
    assert!(plan.iter().all(|s| s.source == AudioSource::Song));
}

#[test]
fn resumed_song_continues_from_its_position() {
    let c = choreo(vec![toggle(0.0), toggle(4.0), toggle(10.0)], Some(10.0), None);
    let plan = plan_audio(&c, 0.0, 20.0);
    assert_eq!(plan.len(), 3);
    assert_eq!((plan[1].start_sec, plan[1].source_start_sec), (10.0, 4.0));
    assert_eq!((plan[1].end_sec, plan[2].start_sec), (16.0, 16.0));
    assert_eq!(plan[2].source_start_sec, 0.0);
}

#[test]
fn range_clipping_advances_the_source_position() {
    let c = choreo(vec![toggle(2.0)], Some(100.0), None);
    let plan = plan_audio(&c, 5.0, 8.0);
    assert_eq!(plan.len(), 1);
    assert_eq!(
        (plan[0].start_sec, plan[0].end_sec, plan[0].source_start_sec),
        (5.0, 8.0, 3.0)
    );
}

#[test]
fn missing_song_is_silent() {
    let c = choreo(vec![toggle(1.0)], None, None);
    assert!(plan_audio(&c, 0.0, 60.0).is_empty());
}

#[test]
fn video_soundtrack_plays_from_its_start() {
    let tap = Cue {
        at: 2.0,
        action: CueAction::TapTree,
    };
    let c = choreo(vec![tap], None, Some(4.0));
    let ep = c.videos[0];
    let plan = plan_audio(&c, 0.0, 60.0);
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].source, AudioSource::Video);
    assert_eq!((plan[0].start_sec, plan[0].end_sec), (ep.start, ep.end));
    assert_eq!(plan[0].source_start_sec, 0.0);
}

#[test]
fn unplayable_video_contributes_nothing() {
    let tap = Cue {
        at: 2.0,
        action: CueAction::TapTree,
    };
    let c = choreo(vec![tap], None, None);
    assert!(plan_audio(&c, 0.0, 60.0).is_empty());
}

#[test]
fn frame_to_sample_uses_rational_fps() {
    let fps = Fps {
        num: 30_000,
        den: 1001,
    };
    assert_eq!(frame_to_sample(0, fps, 48_000), 0);
    assert_eq!(frame_to_sample(30_000, fps, 48_000), 48_048_000);
}

#[test]
fn silent_ranges_have_no_manifest() {
    let c = choreo(Vec::new(), Some(10.0), None);
    let fps = Fps { num: 30, den: 1 };
    let range = FrameRange::new(FrameIndex(0), FrameIndex(30)).unwrap();
    let m = build_audio_manifest(&c, &PreparedMedia::default(), fps, range).unwrap();
    assert!(m.is_none());

    let empty = FrameRange::new(FrameIndex(3), FrameIndex(3)).unwrap();
    assert!(build_audio_manifest(&c, &PreparedMedia::default(), fps, empty).is_err());
}

#[test]
fn planned_song_without_prepared_media_is_skipped() {
    let c = choreo(vec![toggle(0.0)], Some(10.0), None);
    let fps = Fps { num: 30, den: 1 };
    let range = FrameRange::new(FrameIndex(0), FrameIndex(60)).unwrap();
    let m = build_audio_manifest(&c, &PreparedMedia::default(), fps, range).unwrap();
    assert!(m.is_none());
}
