use super::*;

#[test]
fn builtin_revisions_validate() {
    for revision in Calibration::builtin_revisions() {
        let calibration = Calibration::builtin(revision).expect("builtin");
        calibration.validate().expect("valid builtin");
        assert_eq!(calibration.revision, *revision);
    }
}

#[test]
fn unknown_revision_is_rejected() {
    let err = Calibration::builtin("v9").expect_err("should fail");
    assert!(matches!(err, CalibrationError::UnknownRevision(name) if name == "v9"));
}

#[test]
fn asymmetric_hands_are_not_mirrored() {
    let calibration = Calibration::asymmetric();
    assert_eq!(calibration.hand.right.get("horizontal_right"), Some(125));
    assert_eq!(calibration.hand.left.get("horizontal_right"), Some(115));
    assert_eq!(calibration.hand.right.get("horizontal_left"), Some(-25));
    assert_eq!(calibration.hand.left.get("horizontal_left"), Some(0));
    assert_ne!(
        calibration.hand.right.get("vertical"),
        calibration.hand.left.get("vertical")
    );
}

#[test]
fn loads_custom_revision_from_toml() {
    let raw = r#"
revision = "bench"

[arm]
middle = 40
quarter = 20
threequarter = 60

[head]
left = 5
middle = 50
right = 95

[hand.right]
vertical = 48

[hand.left]
vertical = 52
"#;
    let calibration = Calibration::from_toml_str(raw).expect("calibration");
    assert_eq!(calibration.revision, "bench");
    assert_eq!(calibration.arm.get("middle"), Some(40));
    assert_eq!(calibration.head.get("right"), Some(95));
    assert_eq!(calibration.hand.for_side(Side::Left).get("vertical"), Some(52));
    assert_eq!(calibration.hand.command, HandCommand::Set);
}

#[test]
fn hand_command_is_part_of_the_revision() {
    assert_eq!(Calibration::asymmetric().hand.command, HandCommand::Set);
    assert_eq!(Calibration::symmetric().hand.command, HandCommand::Action);

    let raw = r#"
revision = "legacy-bench"

[arm]
middle = 50

[head]
middle = 50

[hand]
command = "action"

[hand.right]
up = 0

[hand.left]
up = 0
"#;
    let calibration = Calibration::from_toml_str(raw).expect("calibration");
    assert_eq!(calibration.hand.command, HandCommand::Action);
}

#[test]
fn mismatched_hand_tables_are_rejected() {
    let raw = r#"
revision = "broken"

[arm]
middle = 50

[head]
middle = 50

[hand.right]
vertical = 50
horizontal_right = 125

[hand.left]
vertical = 57
"#;
    let err = Calibration::from_toml_str(raw).expect_err("should fail");
    match err {
        CalibrationError::HandMismatch {
            right_only,
            left_only,
        } => {
            assert_eq!(right_only, vec!["horizontal_right".to_string()]);
            assert!(left_only.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn arm_table_cannot_shadow_binary_actions() {
    let mut calibration = Calibration::asymmetric();
    calibration.arm = CalibrationTable::from([("up", 100), ("middle", 50)]);
    let err = calibration.validate().expect_err("should fail");
    assert!(matches!(err, CalibrationError::ShadowedArmAction(name) if name == "up"));
}

#[test]
fn empty_table_is_rejected() {
    let mut calibration = Calibration::symmetric();
    calibration.head = CalibrationTable::default();
    let err = calibration.validate().expect_err("should fail");
    assert!(matches!(err, CalibrationError::EmptyTable("head")));
}

#[test]
fn missing_file_reports_path() {
    let path = std::env::temp_dir().join("neo_commands_missing_calibration.toml");
    let err = Calibration::from_file(&path).expect_err("should fail");
    assert!(err.to_string().contains("neo_commands_missing_calibration.toml"));
}
