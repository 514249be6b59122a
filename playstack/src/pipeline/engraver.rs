//! MIDI → PDF score through LilyPond
//!
//! The MIDI file is parsed in-process first so a malformed transcription is
//! reported before any tool runs. Export is `midi2ly` followed by
//! `lilypond`. Every failure here is non-fatal: the run continues without a
//! score.

use super::outcome::StageOutcome;
use super::process::{CommandRunner, Invocation};
use super::reporter::ProgressReporter;
use super::workspace::{Workspace, LILYPOND_FILE};
use midly::{Format, MidiMessage, Smf, Timing, TrackEventKind};
use playstack_common::events::PipelineStage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

const STAGE: PipelineStage = PipelineStage::Engrave;

/// Symbolic summary of a parsed MIDI file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    pub format: &'static str,
    pub tracks: usize,
    /// `None` for SMPTE timecode timing
    pub ticks_per_beat: Option<u16>,
    /// Note-on events with non-zero velocity
    pub notes: usize,
}

/// Parse MIDI bytes into a [`ScoreSummary`]
pub fn summarize_midi(bytes: &[u8]) -> Result<ScoreSummary, midly::Error> {
    let smf = Smf::parse(bytes)?;

    let format = match smf.header.format {
        Format::SingleTrack => "single-track",
        Format::Parallel => "parallel",
        Format::Sequential => "sequential",
    };
    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(ticks) => Some(ticks.as_int()),
        Timing::Timecode(..) => None,
    };
    let notes = smf
        .tracks
        .iter()
        .flat_map(|track| track.iter())
        .filter(|event| {
            matches!(
                event.kind,
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { vel, .. },
                    ..
                } if vel.as_int() > 0
            )
        })
        .count();

    Ok(ScoreSummary {
        format,
        tracks: smf.tracks.len(),
        ticks_per_beat,
        notes,
    })
}

/// Why no score was produced
#[derive(Debug, Error)]
pub enum EngraveError {
    #[error("cannot read {}: {source}", .path.display())]
    ReadMidi {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid MIDI file: {0}")]
    InvalidMidi(#[from] midly::Error),

    #[error("{tool} not available ({source})")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed (exit code {exit_code}): {stderr}")]
    ToolFailed {
        tool: String,
        exit_code: String,
        stderr: String,
    },

    #[error("{tool} produced no {}", .path.display())]
    MissingOutput { tool: String, path: PathBuf },
}

pub struct ScoreEngraver {
    runner: Arc<dyn CommandRunner>,
    midi2ly: String,
    lilypond: String,
}

impl ScoreEngraver {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        midi2ly: impl Into<String>,
        lilypond: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            midi2ly: midi2ly.into(),
            lilypond: lilypond.into(),
        }
    }

    /// Try to produce `score.pdf`; never returns `Fatal`
    pub async fn engrave(
        &self,
        midi: &Path,
        workspace: &Workspace,
        reporter: &mut ProgressReporter,
    ) -> StageOutcome<PathBuf> {
        match self.export(midi, workspace).await {
            Ok(pdf) => {
                reporter.success(STAGE, "Score PDF ready");
                StageOutcome::Success(pdf)
            }
            Err(e) => {
                let reason = e.to_string();
                reporter.warning(STAGE, format!("Could not generate PDF score: {}", reason));
                StageOutcome::Recoverable(reason)
            }
        }
    }

    async fn export(&self, midi: &Path, workspace: &Workspace) -> Result<PathBuf, EngraveError> {
        let bytes = tokio::fs::read(midi)
            .await
            .map_err(|source| EngraveError::ReadMidi {
                path: midi.to_path_buf(),
                source,
            })?;
        let summary = summarize_midi(&bytes)?;
        tracing::debug!(?summary, "Parsed transcription for engraving");

        let ly_path = workspace.file(LILYPOND_FILE);
        let midi2ly = Invocation::new(&self.midi2ly)
            .arg(format!("--output={}", ly_path.display()))
            .arg(midi);
        self.run_step(&self.midi2ly, &midi2ly, &ly_path).await?;

        // lilypond appends ".pdf" to the --output basename
        let pdf_path = workspace.score_path();
        let basename = pdf_path.with_extension("");
        let lilypond = Invocation::new(&self.lilypond)
            .arg("--pdf")
            .arg(format!("--output={}", basename.display()))
            .arg(&ly_path)
            .current_dir(workspace.path());
        self.run_step(&self.lilypond, &lilypond, &pdf_path).await?;

        Ok(pdf_path)
    }

    async fn run_step(
        &self,
        tool: &str,
        invocation: &Invocation,
        expected: &Path,
    ) -> Result<(), EngraveError> {
        let output = self
            .runner
            .run(invocation)
            .await
            .map_err(|source| EngraveError::ToolUnavailable {
                tool: tool.to_string(),
                source,
            })?;

        if !output.is_success() {
            return Err(EngraveError::ToolFailed {
                tool: tool.to_string(),
                exit_code: output.exit_code_display(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        if !expected.is_file() {
            return Err(EngraveError::MissingOutput {
                tool: tool.to_string(),
                path: expected.to_path_buf(),
            });
        }
        Ok(())
    }
}
