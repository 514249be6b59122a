//! MIDI → WAV rendering with FluidSynth
//!
//! Optional stage: a missing SoundFont, a missing binary or a failed render
//! all yield "no audio" with a warning.

use super::outcome::StageOutcome;
use super::process::{CommandRunner, Invocation};
use super::reporter::ProgressReporter;
use super::workspace::Workspace;
use playstack_common::events::PipelineStage;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const STAGE: PipelineStage = PipelineStage::Synthesize;

pub struct Synthesizer {
    runner: Arc<dyn CommandRunner>,
    fluidsynth: String,
    sample_rate: u32,
}

impl Synthesizer {
    pub fn new(runner: Arc<dyn CommandRunner>, fluidsynth: impl Into<String>, sample_rate: u32) -> Self {
        Self {
            runner,
            fluidsynth: fluidsynth.into(),
            sample_rate,
        }
    }

    /// Render `midi` with the instrument bank at `soundfont`
    pub async fn render(
        &self,
        midi: &Path,
        soundfont: &Path,
        workspace: &Workspace,
        reporter: &mut ProgressReporter,
    ) -> StageOutcome<PathBuf> {
        if !soundfont.is_file() {
            reporter.warning(
                STAGE,
                format!(
                    "Sound-font not found at {}. Skipping audio rendering.",
                    soundfont.display()
                ),
            );
            reporter.info(
                STAGE,
                "Download a soundfont like FluidR3_GM.sf2 and place it in the app directory, or set SOUNDFONT_PATH.",
            );
            return StageOutcome::Recoverable("sound-font missing".to_string());
        }

        let wav_path = workspace.render_path();
        let invocation = Invocation::new(&self.fluidsynth)
            .arg("-ni")
            .arg(soundfont)
            .arg(midi)
            .arg("-F")
            .arg(&wav_path)
            .arg("-r")
            .arg(self.sample_rate.to_string());

        match self.runner.run(&invocation).await {
            Ok(output) if output.is_success() => {
                if !wav_path.is_file() {
                    let reason = format!("FluidSynth produced no {}", wav_path.display());
                    reporter.warning(STAGE, reason.clone());
                    return StageOutcome::Recoverable(reason);
                }
                reporter.success(STAGE, "Audio rendered");
                StageOutcome::Success(wav_path)
            }
            Ok(output) => {
                let reason = format!("FluidSynth rendering failed: {}", output.stderr.trim());
                reporter.warning(STAGE, reason.clone());
                StageOutcome::Recoverable(reason)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let reason = "FluidSynth not found. Please install it (brew/apt install fluidsynth).".to_string();
                reporter.warning(STAGE, reason.clone());
                StageOutcome::Recoverable(reason)
            }
            Err(e) => {
                let reason = format!("FluidSynth could not be started: {}", e);
                reporter.warning(STAGE, reason.clone());
                StageOutcome::Recoverable(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::process::test_support::{not_found, ScriptedRunner};
    use crate::pipeline::process::CommandOutput;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn setup() -> (TempDir, Workspace, PathBuf) {
        let root = TempDir::new().unwrap();
        let ws = Workspace::create_in(root.path()).unwrap();
        std::fs::write(ws.midi_path(), b"MThd").unwrap();
        let bank = root.path().join("bank.sf2");
        (root, ws, bank)
    }

    #[tokio::test]
    async fn test_missing_soundfont_skips_without_running() {
        let (_root, ws, bank) = setup();
        let runner = Arc::new(ScriptedRunner::new(|_| Ok(CommandOutput::success())));
        let synth = Synthesizer::new(runner.clone(), "fluidsynth", 44_100);
        let mut reporter = ProgressReporter::detached(Uuid::nil());

        let outcome = synth.render(&ws.midi_path(), &bank, &ws, &mut reporter).await;

        assert!(matches!(outcome, StageOutcome::Recoverable(_)));
        assert!(runner.calls().is_empty());
        assert!(reporter.messages()[0].text.starts_with("Sound-font not found at"));
    }

    #[tokio::test]
    async fn test_render_invocation() {
        let (_root, ws, bank) = setup();
        std::fs::write(&bank, b"sfbk").unwrap();
        let runner = Arc::new(ScriptedRunner::new(|inv| {
            std::fs::write(inv.value_after("-F").unwrap(), b"RIFF").unwrap();
            Ok(CommandOutput::success())
        }));
        let synth = Synthesizer::new(runner.clone(), "fluidsynth", 44_100);
        let mut reporter = ProgressReporter::detached(Uuid::nil());

        let outcome = synth.render(&ws.midi_path(), &bank, &ws, &mut reporter).await;
        assert_eq!(outcome, StageOutcome::Success(ws.render_path()));

        let args = runner.calls()[0].arg_strings();
        assert_eq!(args[0], "-ni");
        assert_eq!(args[1], bank.to_string_lossy());
        assert_eq!(args[2], ws.midi_path().to_string_lossy());
        assert_eq!(&args[5..], &["-r", "44100"]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_recoverable() {
        let (_root, ws, bank) = setup();
        std::fs::write(&bank, b"sfbk").unwrap();
        let runner = Arc::new(ScriptedRunner::new(|_| {
            Ok(CommandOutput::failure(1, "fluidsynth: error: Failed to load SoundFont"))
        }));
        let synth = Synthesizer::new(runner, "fluidsynth", 44_100);
        let mut reporter = ProgressReporter::detached(Uuid::nil());

        let outcome = synth.render(&ws.midi_path(), &bank, &ws, &mut reporter).await;
        assert!(outcome
            .failure_reason()
            .unwrap()
            .contains("Failed to load SoundFont"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_recoverable() {
        let (_root, ws, bank) = setup();
        std::fs::write(&bank, b"sfbk").unwrap();
        let runner = Arc::new(ScriptedRunner::new(|_| Err(not_found())));
        let synth = Synthesizer::new(runner, "fluidsynth", 44_100);
        let mut reporter = ProgressReporter::detached(Uuid::nil());

        let outcome = synth.render(&ws.midi_path(), &bank, &ws, &mut reporter).await;
        assert!(outcome.failure_reason().unwrap().starts_with("FluidSynth not found"));
    }
}
