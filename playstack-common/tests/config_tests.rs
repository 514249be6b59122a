//! Unit tests for configuration loading and graceful degradation
//!
//! Missing TOML files must not stop startup; a present but malformed file
//! must be reported.

use playstack_common::config::{load_or_default, load_toml_config, TomlConfig};
use playstack_common::Error;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_missing_explicit_config_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("absent.toml");

    let config = load_or_default(Some(&missing)).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_full_config_file_parses() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
bind_address = "0.0.0.0:8080"
soundfont_path = "/opt/sf2/GeneralUser.sf2"
max_upload_bytes = 1048576

[logging]
level = "debug"

[tools]
yt_dlp = "/usr/local/bin/yt-dlp"
fluidsynth = "fluidsynth"

[transcription]
onset_threshold = 0.6
melodia_trick = false
"#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.bind_address.as_deref(), Some("0.0.0.0:8080"));
    assert_eq!(
        config.soundfont_path,
        Some(PathBuf::from("/opt/sf2/GeneralUser.sf2"))
    );
    assert_eq!(config.max_upload_bytes, Some(1_048_576));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.tools.yt_dlp.as_deref(), Some("/usr/local/bin/yt-dlp"));
    assert!(config.tools.ffmpeg.is_none());
    assert_eq!(config.transcription.onset_threshold, Some(0.6));
    assert_eq!(config.transcription.melodia_trick, Some(false));
    assert!(config.transcription.frame_threshold.is_none());
}

#[test]
fn test_malformed_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "bind_address = [not valid").unwrap();

    let result = load_or_default(Some(&path));
    assert!(result.is_err(), "Malformed TOML should be reported");
    assert!(result.unwrap_err().to_string().contains("Configuration error"));
}

#[test]
fn test_unreadable_config_file_is_a_config_error() {
    let temp_dir = TempDir::new().unwrap();

    // A directory exists but cannot be read as a file
    let err = load_toml_config(temp_dir.path()).unwrap_err();
    assert!(matches!(err, Error::Config(ref msg) if msg.starts_with("Read ")));
}
