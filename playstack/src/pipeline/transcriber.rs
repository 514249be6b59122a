//! Audio → MIDI transcription with Basic Pitch
//!
//! Two attempts, first success wins:
//! 1. The `basic-pitch` command-line tool, which picks its own output names.
//! 2. The `basic_pitch.inference.predict` library entry point, driven
//!    through the Python interpreter with fixed thresholds and an explicit
//!    output path.
//!
//! The CLI gives no control over the output filename, so after it exits the
//! workspace is searched for the expected names and, failing that, for any
//! MIDI file that appeared during the call. That scan is a compatibility
//! shim for the tool's naming, not part of the transcription contract.

use super::outcome::StageOutcome;
use super::process::{CommandRunner, Invocation};
use super::reporter::ProgressReporter;
use super::workspace::Workspace;
use crate::config::TranscriptionThresholds;
use playstack_common::events::PipelineStage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const STAGE: PipelineStage = PipelineStage::Transcribe;

/// Script run by the library attempt
///
/// argv: audio, output, onset, frame, min note length (ms), min Hz, max Hz,
/// multiple pitch bends (0/1), melodia trick (0/1)
const PREDICT_SCRIPT: &str = r#"import sys
from basic_pitch.inference import predict
audio, out = sys.argv[1], sys.argv[2]
_, midi_data, _ = predict(
    audio,
    onset_threshold=float(sys.argv[3]),
    frame_threshold=float(sys.argv[4]),
    minimum_note_length=float(sys.argv[5]),
    minimum_frequency=float(sys.argv[6]),
    maximum_frequency=float(sys.argv[7]),
    multiple_pitch_bends=sys.argv[8] == "1",
    melodia_trick=sys.argv[9] == "1",
)
midi_data.write(out)
"#;

pub struct Transcriber {
    runner: Arc<dyn CommandRunner>,
    basic_pitch: String,
    python: String,
    thresholds: TranscriptionThresholds,
}

impl Transcriber {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        basic_pitch: impl Into<String>,
        python: impl Into<String>,
        thresholds: TranscriptionThresholds,
    ) -> Self {
        Self {
            runner,
            basic_pitch: basic_pitch.into(),
            python: python.into(),
            thresholds,
        }
    }

    /// Produce `transcription.mid` from `audio`
    ///
    /// Returns `Fatal` only when both attempts failed.
    pub async fn transcribe(
        &self,
        audio: &Path,
        workspace: &Workspace,
        reporter: &mut ProgressReporter,
    ) -> StageOutcome<PathBuf> {
        match self.run_cli(audio, workspace, reporter).await {
            StageOutcome::Success(path) => return StageOutcome::Success(path),
            StageOutcome::Recoverable(reason) | StageOutcome::Fatal(reason) => {
                reporter.warning(STAGE, format!("Command line approach failed: {}", reason));
            }
        }

        match self.run_library(audio, workspace, reporter).await {
            StageOutcome::Success(path) => StageOutcome::Success(path),
            StageOutcome::Recoverable(reason) | StageOutcome::Fatal(reason) => {
                reporter.error(STAGE, format!("Python API also failed: {}", reason));
                StageOutcome::Fatal("Could not generate MIDI file using either method".to_string())
            }
        }
    }

    /// Primary attempt: `basic-pitch <workspace> <audio>`
    async fn run_cli(
        &self,
        audio: &Path,
        workspace: &Workspace,
        reporter: &mut ProgressReporter,
    ) -> StageOutcome<PathBuf> {
        reporter.info(STAGE, "Running basic-pitch command line tool...");

        let before = match workspace.midi_files() {
            Ok(files) => files,
            Err(e) => return StageOutcome::Recoverable(format!("cannot list workspace: {}", e)),
        };

        let invocation = Invocation::new(&self.basic_pitch)
            .arg(workspace.path())
            .arg(audio);

        let output = match self.runner.run(&invocation).await {
            Ok(output) => output,
            Err(e) => {
                return StageOutcome::Recoverable(format!("{} could not be started: {}", self.basic_pitch, e))
            }
        };

        if !output.is_success() {
            reporter.warning(STAGE, format!("Command line tool failed: {}", output.stderr.trim()));
            return StageOutcome::Recoverable(format!(
                "basic-pitch exited with code {}",
                output.exit_code_display()
            ));
        }

        let found = match locate_cli_output(audio, workspace, &before) {
            Ok(Some(path)) => path,
            Ok(None) => {
                return StageOutcome::Recoverable("basic-pitch produced no MIDI file".to_string())
            }
            Err(e) => return StageOutcome::Recoverable(format!("cannot list workspace: {}", e)),
        };

        let canonical = workspace.midi_path();
        if found != canonical {
            if let Err(e) = tokio::fs::rename(&found, &canonical).await {
                return StageOutcome::Recoverable(format!(
                    "cannot rename {}: {}",
                    found.display(),
                    e
                ));
            }
        }

        let name = found
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        reporter.success(STAGE, format!("Found MIDI file: {}", name));
        StageOutcome::Success(canonical)
    }

    /// Fallback attempt through the Basic Pitch Python API
    async fn run_library(
        &self,
        audio: &Path,
        workspace: &Workspace,
        reporter: &mut ProgressReporter,
    ) -> StageOutcome<PathBuf> {
        reporter.info(STAGE, "Trying Python API approach...");

        let midi_path = workspace.midi_path();
        let t = &self.thresholds;
        let flag = |on: bool| if on { "1" } else { "0" };
        let invocation = Invocation::new(&self.python)
            .arg("-c")
            .arg(PREDICT_SCRIPT)
            .arg(audio)
            .arg(&midi_path)
            .args([
                t.onset_threshold.to_string(),
                t.frame_threshold.to_string(),
                t.minimum_note_length.to_string(),
                t.minimum_frequency.to_string(),
                t.maximum_frequency.to_string(),
            ])
            .args([flag(t.multiple_pitch_bends), flag(t.melodia_trick)]);

        let output = match self.runner.run(&invocation).await {
            Ok(output) => output,
            Err(e) => {
                return StageOutcome::Recoverable(format!("{} could not be started: {}", self.python, e))
            }
        };

        if !output.is_success() {
            return StageOutcome::Recoverable(format!(
                "exit code {}: {}",
                output.exit_code_display(),
                output.stderr.trim()
            ));
        }

        if !midi_path.is_file() {
            return StageOutcome::Recoverable(format!(
                "no MIDI written to {}",
                midi_path.display()
            ));
        }

        reporter.success(STAGE, "MIDI generated via Python API!");
        StageOutcome::Success(midi_path)
    }
}

/// Filenames the CLI is known to produce for `audio`, in preference order
pub fn expected_output_names(audio: &Path) -> Vec<String> {
    let stem = audio
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    vec![
        format!("{}_basic_pitch.mid", stem),
        format!("{}.mid", stem),
        "audio_basic_pitch.mid".to_string(),
        "audio.mid".to_string(),
    ]
}

/// Find the CLI's output: expected names first, then new MIDI files
///
/// Known risk: an expected name matches whatever file carries it, even one
/// that predates the call. Workspaces are fresh per run, so only files this
/// run produced can collide.
fn locate_cli_output(
    audio: &Path,
    workspace: &Workspace,
    before: &std::collections::BTreeSet<PathBuf>,
) -> std::io::Result<Option<PathBuf>> {
    for name in expected_output_names(audio) {
        let candidate = workspace.file(&name);
        if candidate.is_file() {
            return Ok(Some(candidate));
        }
    }

    let after = workspace.midi_files()?;
    Ok(after.difference(before).next().cloned())
}
