use super::*;

#[test]
fn starts_idle() {
    let s = CardStore::new();
    assert!(!s.is_wishing);
    assert!(!s.show_surprise);
    assert!(!s.is_video_playing);
    assert_eq!(s.tree_boost_intensity, 0.0);
}

#[test]
fn wish_actions_toggle_flag() {
    let mut s = CardStore::new();
    s.start_wish("a warm winter");
    assert!(s.is_wishing);
    s.end_wish();
    assert!(!s.is_wishing);
}

#[test]
fn start_video_clears_surprise() {
    let mut s = CardStore::new();
    s.trigger_surprise();
    assert!(s.show_surprise);
    s.start_video();
    assert!(s.is_video_playing);
    assert!(!s.show_surprise);
    s.end_video();
    assert!(!s.is_video_playing);
    assert!(!s.show_surprise);
}

#[test]
fn actions_are_unguarded_setters() {
    let mut s = CardStore::new();
    s.start_wish("one");
    s.start_wish("two");
    assert!(s.is_wishing);
    s.set_tree_boost(1.0);
    s.set_tree_boost(0.0);
    assert_eq!(s.tree_boost_intensity, 0.0);
    s.end_video();
    assert!(!s.is_video_playing);
}
