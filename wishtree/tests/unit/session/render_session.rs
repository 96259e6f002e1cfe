use super::*;
use crate::choreo::music::MusicState;
use crate::encode::sink::InMemorySink;

fn tiny_card(duration: u64, script: &str) -> Card {
    let json = format!(
        r#"{{
            "canvas": {{"width": 64, "height": 48}},
            "fps": {{"num": 30, "den": 1}},
            "duration": {duration},
            "seed": 7,
            "scene": {{
                "tree_particles": 400,
                "topper_particles": 120,
                "surprise_particles": 200,
                "snow_particles": 80,
                "wish_particles": 20
            }},
            "script": {script}
        }}"#
    );
    Card::from_reader(json.as_bytes()).unwrap()
}

fn opts(parallel: bool) -> RenderSessionOpts {
    RenderSessionOpts {
        parallel,
        chunk_size: 1024,
        threads: if parallel { Some(2) } else { None },
        channel_capacity: 4,
        enable_audio: false,
        render: RenderSettings::default(),
    }
}

fn range(start: u64, end: u64) -> FrameRange {
    FrameRange {
        start: FrameIndex(start),
        end: FrameIndex(end),
    }
}

#[test]
fn render_range_parallel_inmemory_is_ordered_and_varies_by_frame() {
    let card = tiny_card(8, "[]");
    let sess = RenderSession::new(&card, std::env::temp_dir(), opts(true)).unwrap();

    let mut sink = InMemorySink::new();
    let stats = sess.render_range(range(0, 8), &mut sink).unwrap();

    assert_eq!(
        stats,
        RenderStats {
            frames_total: 8,
            video_frames: 0,
            audio_segments: 0,
        }
    );
    assert!(sink.is_ended());
    assert_eq!(sink.frames().len(), 8);
    for (i, (idx, frame)) in sink.frames().iter().enumerate() {
        assert_eq!(idx.0, i as u64);
        assert_eq!((frame.width, frame.height), (64, 48));
    }

    let a = &sink.frames()[0].1.data;
    let b = &sink.frames()[7].1.data;
    assert_ne!(a, b, "expected frame-to-frame variation");
}

#[test]
fn render_range_parallel_matches_sequential_output() {
    let card = tiny_card(6, r#"[{"at": 0.05, "do": "tap_tree"}]"#);
    let seq = RenderSession::new(&card, std::env::temp_dir(), opts(false)).unwrap();
    let par = RenderSession::new(&card, std::env::temp_dir(), opts(true)).unwrap();

    let mut sink_seq = InMemorySink::new();
    seq.render_range(range(1, 6), &mut sink_seq).unwrap();
    let mut sink_par = InMemorySink::new();
    par.render_range(range(1, 6), &mut sink_par).unwrap();

    assert_eq!(sink_seq.frames().len(), 5);
    assert_eq!(sink_seq.frames().len(), sink_par.frames().len());
    for ((idx_a, a), (idx_b, b)) in sink_seq.frames().iter().zip(sink_par.frames()) {
        assert_eq!(idx_a, idx_b);
        assert_eq!(a.data, b.data);
    }
}

#[test]
fn render_frame_matches_range_output() {
    let card = tiny_card(4, "[]");
    let sess = RenderSession::new(&card, std::env::temp_dir(), opts(false)).unwrap();

    let mut sink = InMemorySink::new();
    sess.render_range(range(2, 4), &mut sink).unwrap();
    let single = sess.render_frame(FrameIndex(3)).unwrap();
    assert_eq!(sink.frames()[1].0, FrameIndex(3));
    assert_eq!(sink.frames()[1].1.data, single.data);
}

#[test]
fn small_chunks_still_deliver_every_frame_once() {
    let card = tiny_card(7, "[]");
    let mut o = opts(true);
    o.chunk_size = 0;
    o.channel_capacity = 0;
    let sess = RenderSession::new(&card, std::env::temp_dir(), o).unwrap();

    let mut sink = InMemorySink::new();
    let stats = sess.render_range(range(0, 7), &mut sink).unwrap();
    assert_eq!(stats.frames_total, 7);
    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, (0..7).collect::<Vec<_>>());
}

#[test]
fn range_and_frame_bounds_are_validated() {
    let card = tiny_card(4, "[]");
    let sess = RenderSession::new(&card, std::env::temp_dir(), opts(false)).unwrap();
    let mut sink = InMemorySink::new();

    assert!(matches!(
        sess.render_range(range(2, 2), &mut sink),
        Err(CardError::Validation(_))
    ));
    assert!(matches!(
        sess.render_range(range(0, 5), &mut sink),
        Err(CardError::Validation(_))
    ));
    assert!(matches!(
        sess.render_frame(FrameIndex(4)),
        Err(CardError::Validation(_))
    ));
    assert!(sink.frames().is_empty());
}

#[test]
fn zero_threads_is_rejected() {
    let card = tiny_card(2, "[]");
    let mut o = opts(true);
    o.threads = Some(0);
    let sess = RenderSession::new(&card, std::env::temp_dir(), o).unwrap();
    let mut sink = InMemorySink::new();
    let err = sess.render_range(range(0, 2), &mut sink).unwrap_err();
    assert!(err.to_string().contains("threads"));
}

#[test]
fn invalid_card_is_rejected_up_front() {
    let mut card = tiny_card(2, "[]");
    card.scene.pixel_ratio = 0.0;
    assert!(matches!(
        RenderSession::new(&card, std::env::temp_dir(), opts(false)),
        Err(CardError::Validation(_))
    ));
}

#[test]
fn missing_lyrics_file_fails_session() {
    let mut card = tiny_card(2, "[]");
    card.song.lyrics = Some(PathBuf::from("definitely-not-here/lyrics.txt"));
    assert!(RenderSession::new(&card, std::env::temp_dir(), opts(false)).is_err());
}

#[test]
fn missing_media_takes_error_paths() {
    let mut card = tiny_card(
        120,
        r#"[{"at": 0.1, "do": "toggle_music"}, {"at": 0.2, "do": "tap_tree"}]"#,
    );
    card.song.path = Some(PathBuf::from("no-such-song.mp3"));
    card.video.path = Some(PathBuf::from("no-such-video.mp4"));
    let sess = RenderSession::new(&card, std::env::temp_dir(), opts(false)).unwrap();

    assert!(sess.media().song.is_none());
    assert!(sess.media().video.is_none());

    let s = sess.eval_frame(FrameIndex(30)).unwrap();
    assert_eq!(s.music.state, MusicState::Error);
    assert!(s.surprise.is_some());

    let choreo = sess.choreography();
    assert_eq!(choreo.surprises.len(), 1);
    // Any video episode that opened closed at once.
    assert!(choreo.videos.iter().all(|v| !v.playable && v.start == v.end));
    assert_eq!(sess.full_range(), range(0, 120));
}

#[test]
fn silent_card_sends_no_audio_to_sink() {
    let card = tiny_card(3, r#"[{"at": 0.0, "do": "toggle_music"}]"#);
    let mut o = opts(false);
    o.enable_audio = true;
    let sess = RenderSession::new(&card, std::env::temp_dir(), o).unwrap();

    let mut sink = InMemorySink::new();
    let stats = sess.render_range(range(0, 3), &mut sink).unwrap();
    assert_eq!(stats.audio_segments, 0);
    let cfg = sink.config().unwrap();
    assert!(cfg.audio.is_none());
    assert_eq!((cfg.width, cfg.height), (64, 48));
}
