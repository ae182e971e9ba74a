use super::*;

#[test]
fn channels_are_solved_highest_first() {
    assert_eq!(ChannelMode::RGBA.channels_to_solve().unwrap(), vec![3, 2, 1, 0]);
    assert_eq!(ChannelMode::RGB.channels_to_solve().unwrap(), vec![2, 1, 0]);
    assert_eq!(ChannelMode::A.channels_to_solve().unwrap(), vec![3]);
    assert_eq!(
        (ChannelMode::R | ChannelMode::B).channels_to_solve().unwrap(),
        vec![2, 0]
    );
}

#[test]
fn empty_mode_is_rejected() {
    let err = ChannelMode::empty().channels_to_solve().unwrap_err();
    assert!(matches!(err, SdfError::InvalidMode));
    assert!(matches!(
        "".parse::<ChannelMode>().unwrap_err(),
        SdfError::InvalidMode
    ));
}

#[test]
fn from_bits_drops_unknown_bits() {
    assert_eq!(ChannelMode::from_bits(0xf8), ChannelMode::A);
    assert!(ChannelMode::from_bits(0xf0).is_empty());
}

#[test]
fn parse_and_display_round_trip() {
    let mode: ChannelMode = "RGBA".parse().unwrap();
    assert_eq!(mode, ChannelMode::RGBA);
    assert_eq!(mode.to_string(), "rgba");

    let mode: ChannelMode = "ar".parse().unwrap();
    assert_eq!(mode, ChannelMode::R | ChannelMode::A);
    assert_eq!(mode.to_string(), "ra");

    assert!("rgbx".parse::<ChannelMode>().is_err());
    assert_eq!(ChannelMode::empty().to_string(), "none");
}

#[test]
fn color_queries() {
    assert!(!ChannelMode::A.touches_color());
    assert!(ChannelMode::RGB.touches_color());
    assert!(ChannelMode::RGBA.contains(ChannelMode::RGB));
    assert!(!ChannelMode::RGB.contains(ChannelMode::A));
    assert!(ChannelMode::G.has_channel(1));
    assert!(!ChannelMode::G.has_channel(4));
}

#[test]
fn serde_uses_letter_string() {
    let json = serde_json::to_string(&ChannelMode::RGB).unwrap();
    assert_eq!(json, "\"rgb\"");
    let back: ChannelMode = serde_json::from_str("\"a\"").unwrap();
    assert_eq!(back, ChannelMode::A);
    assert!(serde_json::from_str::<ChannelMode>("\"q\"").is_err());
}

#[test]
fn displayed_empty_mode_parses_as_invalid_mode() {
    let shown = ChannelMode::empty().to_string();
    assert!(matches!(
        shown.parse::<ChannelMode>().unwrap_err(),
        SdfError::InvalidMode
    ));
    assert!(matches!(
        "NONE".parse::<ChannelMode>().unwrap_err(),
        SdfError::InvalidMode
    ));

    let json = serde_json::to_string(&ChannelMode::empty()).unwrap();
    let err = serde_json::from_str::<ChannelMode>(&json).unwrap_err();
    assert!(err.to_string().contains("invalid mode"));
}
