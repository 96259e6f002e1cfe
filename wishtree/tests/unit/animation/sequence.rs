use super::*;

#[test]
fn sequential_tweens_chain_from_current_value() {
    let mut seq = Sequence::new();
    seq.to(Track::Opacity, 1.0, 1.0, Ease::Linear)
        .pause(1.5)
        .to(Track::Opacity, 0.0, 0.5, Ease::Linear);
    let tl = seq.build().unwrap();

    assert_eq!(tl.duration(), 3.0);
    assert_eq!(tl.sample(Track::Opacity, 0.0), 0.0);
    assert_eq!(tl.sample(Track::Opacity, 0.5), 0.5);
    assert_eq!(tl.sample(Track::Opacity, 2.0), 1.0);
    assert_eq!(tl.sample(Track::Opacity, 2.75), 0.5);
    assert_eq!(tl.sample(Track::Opacity, 10.0), 0.0);
}

#[test]
fn set_pins_initial_value() {
    let mut seq = Sequence::new();
    seq.set(Track::Boost, 2.0)
        .pause(2.5)
        .to(Track::Boost, 8.0, 0.5, Ease::Linear);
    let tl = seq.build().unwrap();
    assert_eq!(tl.sample(Track::Boost, 0.0), 2.0);
    assert_eq!(tl.sample(Track::Boost, 2.5), 2.0);
    assert_eq!(tl.sample(Track::Boost, 2.75), 5.0);
    assert_eq!(tl.sample(Track::Boost, 3.0), 8.0);
}

#[test]
fn with_runs_in_parallel() {
    let mut seq = Sequence::new();
    seq.set(Track::Scale, 1.0)
        .to(Track::Progress, 1.0, 2.0, Ease::Linear)
        .with(Track::Scale, 0.5, 2.0, Ease::Linear);
    let tl = seq.build().unwrap();
    assert_eq!(tl.duration(), 2.0);
    assert_eq!(tl.sample(Track::Progress, 1.0), 0.5);
    assert_eq!(tl.sample(Track::Scale, 1.0), 0.75);
}

#[test]
fn untouched_track_reads_zero() {
    let mut seq = Sequence::new();
    seq.to(Track::Opacity, 1.0, 1.0, Ease::Linear);
    let tl = seq.build().unwrap();
    assert_eq!(tl.sample(Track::Explosion, 0.5), 0.0);
}

#[test]
fn negative_durations_fail_build() {
    let mut seq = Sequence::new();
    seq.to(Track::Opacity, 1.0, -1.0, Ease::Linear);
    assert!(seq.build().is_err());

    let mut seq = Sequence::new();
    seq.pause(f64::NAN);
    assert!(seq.build().is_err());
}

#[test]
fn overlapping_tween_on_same_track_fails_build() {
    let mut seq = Sequence::new();
    seq.to(Track::Opacity, 1.0, 2.0, Ease::Linear)
        .with(Track::Opacity, 0.0, 1.0, Ease::Linear);
    assert!(seq.build().is_err());
}

#[test]
fn first_deferred_error_is_reported_once() {
    let mut seq = Sequence::new();
    seq.to(Track::Opacity, 1.0, -1.0, Ease::Linear).pause(f64::NAN);
    let err = seq.build().unwrap_err();
    assert!(matches!(err, CardError::Animation(_)));
    assert!(err.to_string().contains("tween duration"));

    // The error is consumed; the builder is usable again.
    seq.to(Track::Boost, 2.0, 1.0, Ease::Linear);
    let tl = seq.build().unwrap();
    assert_eq!(tl.sample(Track::Boost, 1.0), 2.0);
}
