//! Integration tests for soundstage settings persistence.

use soundstage::{AudioSettings, DEFAULT_CHANNELS};

/// Saved settings come back with the same values.
#[test]
fn save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config").join("audio.json");

    let settings = AudioSettings {
        sample_rate: 48000,
        channel_limit: 16,
        music_volume: 0.25,
        sound_enabled: false,
        ..AudioSettings::default()
    };
    settings.save_to(&path).unwrap();

    let loaded = AudioSettings::load_from(&path).unwrap();
    assert_eq!(loaded.sample_rate, 48000);
    assert_eq!(loaded.channel_limit, 16);
    assert!((loaded.music_volume - 0.25).abs() < f32::EPSILON);
    assert!(!loaded.sound_enabled);
    assert!(loaded.music_enabled);
}

/// A missing file is an error from the low-level loader; the high-level
/// loader falls back to defaults instead.
#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    assert!(AudioSettings::load_from(&dir.path().join("nope.json")).is_err());

    let defaults = AudioSettings::default();
    assert_eq!(defaults.channel_limit, DEFAULT_CHANNELS);
    assert!(defaults.sound_enabled);
}

/// Unknown fields in an older or newer config file are tolerated.
#[test]
fn extra_fields_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audio.json");
    std::fs::write(&path, r#"{"sample_rate": 22050, "legacy_driver": "openal"}"#).unwrap();

    let loaded = AudioSettings::load_from(&path).unwrap();
    assert_eq!(loaded.sample_rate, 22050);
}
