//! Resolved runtime configuration
//!
//! Built once at startup from command-line/environment overrides, the TOML
//! file, and compiled defaults. Stages receive the values they need as
//! explicit arguments; nothing here is read from the environment later.

use playstack_common::config::{
    resolve_setting, CompiledDefaults, TomlConfig, ToolsConfig, TranscriptionConfig,
};
use std::path::PathBuf;

/// Program names (or paths) of the external tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub yt_dlp: String,
    pub basic_pitch: String,
    pub python: String,
    pub midi2ly: String,
    pub lilypond: String,
    pub fluidsynth: String,
    pub ffmpeg: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            yt_dlp: "yt-dlp".to_string(),
            basic_pitch: "basic-pitch".to_string(),
            python: "python3".to_string(),
            midi2ly: "midi2ly".to_string(),
            lilypond: "lilypond".to_string(),
            fluidsynth: "fluidsynth".to_string(),
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

impl ToolPaths {
    pub fn from_toml(tools: &ToolsConfig) -> Self {
        let defaults = Self::default();
        let pick = |value: &Option<String>, default: String| value.clone().unwrap_or(default);
        Self {
            yt_dlp: pick(&tools.yt_dlp, defaults.yt_dlp),
            basic_pitch: pick(&tools.basic_pitch, defaults.basic_pitch),
            python: pick(&tools.python, defaults.python),
            midi2ly: pick(&tools.midi2ly, defaults.midi2ly),
            lilypond: pick(&tools.lilypond, defaults.lilypond),
            fluidsynth: pick(&tools.fluidsynth, defaults.fluidsynth),
            ffmpeg: pick(&tools.ffmpeg, defaults.ffmpeg),
        }
    }

    /// `(label, program, probe argument)` for availability checks
    pub fn probes(&self) -> Vec<(&'static str, &str, &'static str)> {
        vec![
            ("yt-dlp", self.yt_dlp.as_str(), "--version"),
            ("basic-pitch", self.basic_pitch.as_str(), "--help"),
            ("python", self.python.as_str(), "--version"),
            ("midi2ly", self.midi2ly.as_str(), "--version"),
            ("lilypond", self.lilypond.as_str(), "--version"),
            ("fluidsynth", self.fluidsynth.as_str(), "--version"),
            ("ffmpeg", self.ffmpeg.as_str(), "-version"),
        ]
    }
}

/// Thresholds for the library transcription attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranscriptionThresholds {
    pub onset_threshold: f32,
    pub frame_threshold: f32,
    /// Milliseconds
    pub minimum_note_length: f32,
    /// Hz (C1)
    pub minimum_frequency: f32,
    /// Hz (C7)
    pub maximum_frequency: f32,
    pub multiple_pitch_bends: bool,
    pub melodia_trick: bool,
}

impl Default for TranscriptionThresholds {
    fn default() -> Self {
        Self {
            onset_threshold: 0.5,
            frame_threshold: 0.3,
            minimum_note_length: 127.70,
            minimum_frequency: 32.7,
            maximum_frequency: 2093.0,
            multiple_pitch_bends: false,
            melodia_trick: true,
        }
    }
}

impl TranscriptionThresholds {
    pub fn from_toml(section: &TranscriptionConfig) -> Self {
        let d = Self::default();
        Self {
            onset_threshold: section.onset_threshold.unwrap_or(d.onset_threshold),
            frame_threshold: section.frame_threshold.unwrap_or(d.frame_threshold),
            minimum_note_length: section.minimum_note_length.unwrap_or(d.minimum_note_length),
            minimum_frequency: section.minimum_frequency.unwrap_or(d.minimum_frequency),
            maximum_frequency: section.maximum_frequency.unwrap_or(d.maximum_frequency),
            multiple_pitch_bends: section.multiple_pitch_bends.unwrap_or(d.multiple_pitch_bends),
            melodia_trick: section.melodia_trick.unwrap_or(d.melodia_trick),
        }
    }
}

/// Values supplied on the command line or through their environment variables
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub soundfont_path: Option<PathBuf>,
    pub scratch_root: Option<PathBuf>,
    pub max_upload_bytes: Option<usize>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    /// SoundFont handed to the synthesizer at call time
    pub soundfont_path: PathBuf,
    pub scratch_root: PathBuf,
    pub max_upload_bytes: usize,
    pub render_sample_rate: u32,
    pub tools: ToolPaths,
    pub thresholds: TranscriptionThresholds,
}

impl AppConfig {
    pub fn resolve(overrides: ConfigOverrides, toml: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::for_current_process();

        Self {
            bind_address: resolve_setting(
                "bind_address",
                overrides.bind_address,
                toml.bind_address.clone(),
                defaults.bind_address,
            ),
            soundfont_path: resolve_setting(
                "soundfont_path",
                overrides.soundfont_path,
                toml.soundfont_path.clone(),
                defaults.soundfont_path,
            ),
            scratch_root: resolve_setting(
                "scratch_root",
                overrides.scratch_root,
                toml.scratch_root.clone(),
                defaults.scratch_root,
            ),
            max_upload_bytes: resolve_setting(
                "max_upload_bytes",
                overrides.max_upload_bytes,
                toml.max_upload_bytes,
                defaults.max_upload_bytes,
            ),
            render_sample_rate: resolve_setting(
                "render_sample_rate",
                None,
                toml.render_sample_rate,
                defaults.render_sample_rate,
            ),
            tools: ToolPaths::from_toml(&toml.tools),
            thresholds: TranscriptionThresholds::from_toml(&toml.transcription),
        }
    }

    /// Compiled defaults with an explicit scratch root and SoundFont
    pub fn with_paths(scratch_root: PathBuf, soundfont_path: PathBuf) -> Self {
        let overrides = ConfigOverrides {
            soundfont_path: Some(soundfont_path),
            scratch_root: Some(scratch_root),
            ..Default::default()
        };
        Self::resolve(overrides, &TomlConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_thresholds() {
        let t = TranscriptionThresholds::default();
        assert_eq!(t.onset_threshold, 0.5);
        assert_eq!(t.frame_threshold, 0.3);
        assert_eq!(t.minimum_note_length, 127.70);
        assert_eq!(t.minimum_frequency, 32.7);
        assert_eq!(t.maximum_frequency, 2093.0);
        assert!(!t.multiple_pitch_bends);
        assert!(t.melodia_trick);
    }

    #[test]
    fn test_override_beats_toml_beats_default() {
        let toml = TomlConfig {
            bind_address: Some("0.0.0.0:9000".to_string()),
            soundfont_path: Some(PathBuf::from("/toml/bank.sf2")),
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            soundfont_path: Some(PathBuf::from("/env/bank.sf2")),
            ..Default::default()
        };

        let config = AppConfig::resolve(overrides, &toml);
        assert_eq!(config.soundfont_path, PathBuf::from("/env/bank.sf2"));
        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert_eq!(config.render_sample_rate, 44_100);
        assert_eq!(config.tools, ToolPaths::default());
    }

    #[test]
    fn test_tool_paths_partial_toml() {
        let tools = ToolsConfig {
            ffmpeg: Some("/opt/ffmpeg/bin/ffmpeg".to_string()),
            ..Default::default()
        };
        let paths = ToolPaths::from_toml(&tools);
        assert_eq!(paths.ffmpeg, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(paths.yt_dlp, "yt-dlp");
        assert_eq!(paths.probes().len(), 7);
    }

    #[test]
    fn test_thresholds_partial_toml() {
        let section = TranscriptionConfig {
            frame_threshold: Some(0.25),
            melodia_trick: Some(false),
            ..Default::default()
        };
        let t = TranscriptionThresholds::from_toml(&section);
        assert_eq!(t.frame_threshold, 0.25);
        assert!(!t.melodia_trick);
        assert_eq!(t.onset_threshold, 0.5);
    }
}
