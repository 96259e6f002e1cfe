use super::*;

#[test]
fn toggling_opens_and_closes_intervals() {
    let mut p = MusicPlayer::new(Some(10.0));
    p.toggle(1.0);
    p.toggle(4.0);
    p.toggle(6.0);
    let tl = p.finish(20.0);

    assert_eq!(tl.state_at(0.5), MusicState::Paused);
    assert_eq!(tl.state_at(1.0), MusicState::Playing);
    assert_eq!(tl.state_at(5.0), MusicState::Paused);
    assert_eq!(tl.state_at(19.0), MusicState::Playing);

    assert_eq!(
        tl.intervals,
        vec![
            PlayInterval {
                start: 1.0,
                end: 4.0,
                offset: 0.0
            },
            PlayInterval {
                start: 6.0,
                end: 20.0,
                offset: 3.0
            },
        ]
    );
}

#[test]
fn position_holds_while_paused_and_loops() {
    let mut p = MusicPlayer::new(Some(10.0));
    p.toggle(1.0);
    p.toggle(4.0);
    p.toggle(6.0);
    let tl = p.finish(20.0);

    assert_eq!(tl.position_at(0.0), 0.0);
    assert!((tl.position_at(2.5) - 1.5).abs() < 1e-9);
    assert!((tl.position_at(5.0) - 3.0).abs() < 1e-9);
    // 3 s already played, 7 s more reaches the loop point.
    assert!((tl.position_at(13.0) - 0.0).abs() < 1e-9);
    assert!((tl.position_at(15.5) - 2.5).abs() < 1e-9);
}

#[test]
fn missing_song_stays_in_error_after_retry() {
    let mut p = MusicPlayer::new(None);
    p.toggle(2.0);
    p.toggle(3.0);
    let tl = p.finish(10.0);
    assert_eq!(tl.state_at(0.0), MusicState::Error);
    assert_eq!(tl.state_at(5.0), MusicState::Error);
    assert_eq!(tl.changes.len(), 1);
    assert!(tl.intervals.is_empty());
    assert_eq!(tl.position_at(5.0), 0.0);
}
