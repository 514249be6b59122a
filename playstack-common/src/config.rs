//! Configuration file loading and tiered setting resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument or its environment variable (merged by clap)
//! 2. TOML config file
//! 3. Compiled default (fallback)
//!
//! A missing config file is not an error: startup continues with defaults
//! and a warning. A config file that exists but cannot be parsed is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "PLAYSTACK_CONFIG";

/// File name of the default SoundFont, expected next to the executable
pub const DEFAULT_SOUNDFONT_FILE: &str = "FluidR3_GM.sf2";

/// Logging section of the TOML file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset (e.g. "info", "debug")
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// `[tools]` section: program names or absolute paths of external tools
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfig {
    pub yt_dlp: Option<String>,
    pub basic_pitch: Option<String>,
    pub python: Option<String>,
    pub midi2ly: Option<String>,
    pub lilypond: Option<String>,
    pub fluidsynth: Option<String>,
    pub ffmpeg: Option<String>,
}

/// `[transcription]` section: thresholds for the library fallback attempt
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TranscriptionConfig {
    pub onset_threshold: Option<f32>,
    pub frame_threshold: Option<f32>,
    /// Milliseconds
    pub minimum_note_length: Option<f32>,
    /// Hz
    pub minimum_frequency: Option<f32>,
    /// Hz
    pub maximum_frequency: Option<f32>,
    pub multiple_pitch_bends: Option<bool>,
    pub melodia_trick: Option<bool>,
}

/// Contents of `config.toml`
///
/// Every field is optional; absent fields fall through to compiled defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Socket address the web service binds to
    pub bind_address: Option<String>,
    /// SoundFont used by the synthesizer
    pub soundfont_path: Option<PathBuf>,
    /// Directory under which per-run workspaces are created
    pub scratch_root: Option<PathBuf>,
    /// Largest accepted upload body, in bytes
    pub max_upload_bytes: Option<usize>,
    /// Sample rate passed to the synthesizer
    pub render_sample_rate: Option<u32>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
}

/// Compiled fallback values
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub bind_address: String,
    pub soundfont_path: PathBuf,
    pub scratch_root: PathBuf,
    pub max_upload_bytes: usize,
    pub render_sample_rate: u32,
}

impl CompiledDefaults {
    /// Defaults for the running process
    ///
    /// The SoundFont defaults to `FluidR3_GM.sf2` colocated with the
    /// executable; the current directory is used when the executable path
    /// cannot be determined.
    pub fn for_current_process() -> Self {
        let app_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            bind_address: "127.0.0.1:5780".to_string(),
            soundfont_path: app_dir.join(DEFAULT_SOUNDFONT_FILE),
            scratch_root: std::env::temp_dir(),
            max_upload_bytes: 200 * 1024 * 1024,
            render_sample_rate: 44_100,
        }
    }
}

/// Default config file location: `<config_dir>/playstack/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("playstack").join("config.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the config file if present, falling back to an empty config
///
/// `explicit` is the path given on the command line or via
/// `PLAYSTACK_CONFIG`; a missing explicit file is still only a warning.
pub fn load_or_default(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => {
                warn!("Could not determine config directory; using compiled defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    if !path.exists() {
        warn!(
            "Config file not found at {}; using compiled defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let config = load_toml_config(&path)?;
    info!("Loaded config file {}", path.display());
    Ok(config)
}

/// Pick a setting value by priority: override, then TOML, then default
pub fn resolve_setting<T: Debug>(
    name: &str,
    override_value: Option<T>,
    toml_value: Option<T>,
    default: T,
) -> T {
    if let Some(value) = override_value {
        debug!(setting = name, ?value, "Using command-line/environment value");
        return value;
    }
    if let Some(value) = toml_value {
        debug!(setting = name, ?value, "Using TOML value");
        return value;
    }
    debug!(setting = name, value = ?default, "Using compiled default");
    default
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_setting_priority() {
        assert_eq!(resolve_setting("port", Some(1), Some(2), 3), 1);
        assert_eq!(resolve_setting("port", None, Some(2), 3), 2);
        assert_eq!(resolve_setting("port", None::<u16>, None, 3), 3);
    }

    #[test]
    fn test_default_soundfont_is_colocated_with_executable() {
        let defaults = CompiledDefaults::for_current_process();
        assert_eq!(
            defaults.soundfont_path.file_name().and_then(|n| n.to_str()),
            Some(DEFAULT_SOUNDFONT_FILE)
        );
        assert_eq!(defaults.render_sample_rate, 44_100);
    }

    #[test]
    fn test_empty_toml_parses_to_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.logging.level, "info");
    }
}
