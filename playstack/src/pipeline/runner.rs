//! Pipeline orchestration
//!
//! Transcription: acquire → transcribe → engrave (optional) → synthesize
//! (optional) → present. Instrumental: download → remove vocals → present.
//!
//! Each run owns a fresh [`Workspace`]. Artifact bytes are read into the
//! [`Presentation`] before the workspace goes out of scope, so the scratch
//! directory is gone by the time the report is returned, whether the run
//! completed or failed.

use super::acquirer::AudioAcquirer;
use super::engraver::ScoreEngraver;
use super::outcome::{PipelineError, StageOutcome};
use super::presenter::{present_instrumental, present_transcription, Presentation, ProducedArtifacts};
use super::process::CommandRunner;
use super::reporter::ProgressReporter;
use super::source::SourceReference;
use super::synthesizer::Synthesizer;
use super::transcriber::Transcriber;
use super::vocal_remover::VocalRemover;
use super::workspace::Workspace;
use crate::config::AppConfig;
use playstack_common::events::{
    EventBus, PipelineKind, PipelineStage, PlaystackEvent, StageMessage,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Form fields submitted to the transcription pipeline
#[derive(Debug, Clone, Default)]
pub struct TranscriptionRequest {
    pub url: Option<String>,
    /// Uploaded file name (if the browser sent one) and bytes
    pub upload: Option<(Option<String>, Vec<u8>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// Everything the operator sees once a run ends
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub pipeline: PipelineKind,
    pub status: RunStatus,
    pub messages: Vec<StageMessage>,
    /// Verbatim fatal error text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation: Option<Presentation>,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn has_warnings(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == playstack_common::events::MessageLevel::Warning)
    }
}

/// Fatal error tagged with the stage it stopped
struct StageFailure {
    stage: PipelineStage,
    error: PipelineError,
}

fn at<E: Into<PipelineError>>(stage: PipelineStage) -> impl FnOnce(E) -> StageFailure {
    move |e| StageFailure {
        stage,
        error: e.into(),
    }
}

/// Shared collaborators for pipeline runs
#[derive(Clone)]
pub struct PipelineContext {
    pub config: Arc<AppConfig>,
    pub runner: Arc<dyn CommandRunner>,
    pub event_bus: EventBus,
}

impl PipelineContext {
    pub fn new(config: Arc<AppConfig>, runner: Arc<dyn CommandRunner>, event_bus: EventBus) -> Self {
        Self {
            config,
            runner,
            event_bus,
        }
    }

    fn acquirer(&self) -> AudioAcquirer {
        AudioAcquirer::new(self.runner.clone(), &self.config.tools.yt_dlp)
    }

    /// Audio → MIDI → score → rendered audio
    pub async fn run_transcription(&self, request: TranscriptionRequest) -> RunReport {
        let mut reporter = self.start(PipelineKind::Transcription);
        let result = self.transcription_stages(request, &mut reporter).await;
        finish(PipelineKind::Transcription, reporter, result)
    }

    /// Remote audio → center-channel-suppressed instrumental
    pub async fn run_instrumental(&self, url: Option<String>) -> RunReport {
        let mut reporter = self.start(PipelineKind::Instrumental);
        let result = self.instrumental_stages(url, &mut reporter).await;
        finish(PipelineKind::Instrumental, reporter, result)
    }

    fn start(&self, pipeline: PipelineKind) -> ProgressReporter {
        let run_id = Uuid::new_v4();
        tracing::info!(run_id = %run_id, ?pipeline, "Run started");
        let reporter = ProgressReporter::new(run_id, self.event_bus.clone());
        reporter.emit(PlaystackEvent::RunStarted {
            run_id,
            pipeline,
            timestamp: chrono::Utc::now(),
        });
        reporter
    }

    async fn transcription_stages(
        &self,
        request: TranscriptionRequest,
        reporter: &mut ProgressReporter,
    ) -> Result<Presentation, StageFailure> {
        let source = SourceReference::select(request.url, request.upload)
            .map_err(at(PipelineStage::Acquire))?;
        tracing::debug!(run_id = %reporter.run_id(), source = %source.describe(), "Source selected");

        let workspace = Workspace::create_in(&self.config.scratch_root)
            .map_err(at(PipelineStage::Acquire))?;

        let audio = self
            .acquirer()
            .acquire(&source, &workspace, reporter)
            .await
            .map_err(at(PipelineStage::Acquire))?;

        reporter.info(PipelineStage::Transcribe, "Transcribing audio → MIDI (Basic Pitch)…");
        let transcriber = Transcriber::new(
            self.runner.clone(),
            &self.config.tools.basic_pitch,
            &self.config.tools.python,
            self.config.thresholds,
        );
        let midi = match transcriber.transcribe(&audio, &workspace, reporter).await {
            StageOutcome::Success(path) => path,
            StageOutcome::Recoverable(reason) | StageOutcome::Fatal(reason) => {
                return Err(at(PipelineStage::Transcribe)(PipelineError::Transcription(reason)));
            }
        };
        reporter.success(PipelineStage::Transcribe, "MIDI ready!");

        reporter.info(PipelineStage::Engrave, "Engraving score… (needs LilyPond)");
        let engraver = ScoreEngraver::new(
            self.runner.clone(),
            &self.config.tools.midi2ly,
            &self.config.tools.lilypond,
        );
        let score = engraver.engrave(&midi, &workspace, reporter).await.artifact();

        reporter.info(PipelineStage::Synthesize, "Rendering audio… (FluidSynth)");
        let synthesizer = Synthesizer::new(
            self.runner.clone(),
            &self.config.tools.fluidsynth,
            self.config.render_sample_rate,
        );
        let rendered = synthesizer
            .render(&midi, &self.config.soundfont_path, &workspace, reporter)
            .await
            .artifact();

        let artifacts = ProducedArtifacts {
            midi: Some(midi),
            score,
            audio: rendered,
        };
        present_transcription(&artifacts, reporter)
            .await
            .map_err(at(PipelineStage::Present))
    }

    async fn instrumental_stages(
        &self,
        url: Option<String>,
        reporter: &mut ProgressReporter,
    ) -> Result<Presentation, StageFailure> {
        let url = url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(PipelineError::MissingUrl)
            .map_err(at(PipelineStage::Acquire))?;

        let workspace = Workspace::create_in(&self.config.scratch_root)
            .map_err(at(PipelineStage::Acquire))?;

        reporter.info(PipelineStage::Acquire, "Downloading YouTube audio…");
        let audio = self
            .acquirer()
            .download(&url, &workspace)
            .await
            .map_err(at(PipelineStage::Acquire))?;

        reporter.info(PipelineStage::RemoveVocals, "Removing vocals…");
        let output = workspace.instrumental_path();
        VocalRemover::new(self.runner.clone(), &self.config.tools.ffmpeg)
            .remove_vocals(&audio, &output)
            .await
            .map_err(at(PipelineStage::RemoveVocals))?;
        reporter.success(PipelineStage::RemoveVocals, "Instrumental ready!");

        present_instrumental(&output)
            .await
            .map_err(at(PipelineStage::Present))
    }
}

fn finish(
    pipeline: PipelineKind,
    mut reporter: ProgressReporter,
    result: Result<Presentation, StageFailure>,
) -> RunReport {
    let run_id = reporter.run_id();
    match result {
        Ok(presentation) => {
            reporter.emit(PlaystackEvent::RunCompleted {
                run_id,
                artifacts: presentation.filenames(),
                timestamp: chrono::Utc::now(),
            });
            tracing::info!(run_id = %run_id, downloads = presentation.downloads.len(), "Run completed");
            RunReport {
                run_id,
                pipeline,
                status: RunStatus::Completed,
                messages: reporter.into_messages(),
                error: None,
                presentation: Some(presentation),
            }
        }
        Err(StageFailure { stage, error }) => {
            let text = error.to_string();
            reporter.error(stage, text.clone());
            reporter.emit(PlaystackEvent::RunFailed {
                run_id,
                error: text.clone(),
                timestamp: chrono::Utc::now(),
            });
            RunReport {
                run_id,
                pipeline,
                status: RunStatus::Failed,
                messages: reporter.into_messages(),
                error: Some(text),
                presentation: None,
            }
        }
    }
}
