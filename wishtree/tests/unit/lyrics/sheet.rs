use super::*;

#[test]
fn pairs_timestamps_with_following_text() {
    let sheet = parse_lyrics(
        "
        00:05
        first line

        00:12
          second line
        ",
    );
    assert_eq!(
        sheet.lines(),
        &[
            LyricLine {
                time: 5.0,
                text: "first line".to_owned()
            },
            LyricLine {
                time: 12.0,
                text: "second line".to_owned()
            },
        ]
    );
}

#[test]
fn leading_byte_order_mark_keeps_first_line() {
    let sheet = parse_lyrics("\u{FEFF}00:21\nfirst\n00:24\nsecond");
    let times: Vec<f64> = sheet.lines().iter().map(|l| l.time).collect();
    assert_eq!(times, vec![21.0, 24.0]);
    assert_eq!(sheet.lines()[0].text, "first");
}

#[test]
fn minutes_are_folded_into_seconds() {
    let sheet = parse_lyrics("01:30\nhello");
    assert_eq!(sheet.lines()[0].time, 90.0);
}

#[test]
fn timestamp_followed_by_timestamp_is_dropped() {
    let sheet = parse_lyrics("00:01\n00:02\nsecond\n00:09");
    assert_eq!(sheet.lines().len(), 1);
    assert_eq!(sheet.lines()[0].time, 2.0);
    assert_eq!(sheet.lines()[0].text, "second");
}

#[test]
fn stray_text_and_malformed_stamps_are_ignored() {
    let sheet = parse_lyrics("intro words\n0:05\nnope\n00:5\nnope\n00:07\nyes");
    assert_eq!(sheet.lines().len(), 1);
    assert_eq!(sheet.lines()[0].text, "yes");
}

#[test]
fn sort_is_stable_for_equal_times() {
    let sheet = parse_lyrics("00:10\nlate\n00:03\nearly a\n00:03\nearly b");
    let texts: Vec<&str> = sheet.lines().iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["early a", "early b", "late"]);
}

#[test]
fn line_at_returns_last_started_line() {
    let sheet = parse_lyrics("00:02\na\n00:05\nb\n00:09\nc");
    assert!(sheet.line_at(0.0).is_none());
    assert!(sheet.line_at(1.99).is_none());
    assert_eq!(sheet.line_at(2.0).map(|l| l.text.as_str()), Some("a"));
    assert_eq!(sheet.line_at(7.5).map(|l| l.text.as_str()), Some("b"));
    assert_eq!(sheet.line_at(500.0).map(|l| l.text.as_str()), Some("c"));
}

#[test]
fn empty_input_gives_empty_sheet() {
    assert!(parse_lyrics("   \n\n").is_empty());
    assert!(parse_lyrics("").line_at(3.0).is_none());
}

#[test]
fn builtin_sheet_parses() {
    let sheet = LyricSheet::builtin();
    assert!(!sheet.is_empty());
    assert!(sheet.lines().windows(2).all(|w| w[0].time <= w[1].time));
}
