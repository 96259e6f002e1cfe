use super::*;

#[test]
fn cues_parse_from_tagged_json() {
    let cues: Vec<Cue> = serde_json::from_str(
        r#"[
            {"at": 1.0, "do": "toggle_music"},
            {"at": 4.5, "do": "wish", "text": "snow on the roof", "type_secs": 2.0},
            {"at": 9.0, "do": "wish", "text": "again"},
            {"at": 12.0, "do": "tap_tree"},
            {"at": 20.0, "do": "close_video"}
        ]"#,
    )
    .unwrap();

    assert_eq!(cues.len(), 5);
    assert_eq!(cues[0].action, CueAction::ToggleMusic);
    assert_eq!(
        cues[1].action,
        CueAction::Wish {
            text: "snow on the roof".to_owned(),
            type_secs: Some(2.0)
        }
    );
    assert_eq!(cues[1].type_secs(), 2.0);
    assert_eq!(cues[2].type_secs(), DEFAULT_TYPE_SECS);
    assert_eq!(cues[3].action.name(), "tap_tree");
    assert_eq!(cues[4].action, CueAction::CloseVideo);
}

#[test]
fn unknown_action_is_rejected() {
    let res: Result<Cue, _> = serde_json::from_str(r#"{"at": 1.0, "do": "dance"}"#);
    assert!(res.is_err());
}

#[test]
fn negative_or_nan_times_fail_validation() {
    let bad = Cue {
        at: -1.0,
        action: CueAction::TapTree,
    };
    assert!(bad.validate().is_err());

    let nan = Cue {
        at: f64::NAN,
        action: CueAction::TapTree,
    };
    assert!(nan.validate().is_err());

    let bad_typing = Cue {
        at: 1.0,
        action: CueAction::Wish {
            text: "x".to_owned(),
            type_secs: Some(-0.5),
        },
    };
    assert!(bad_typing.validate().is_err());
}
