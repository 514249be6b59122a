//! Turns produced files into download offers and playback widgets
//!
//! Artifact bytes are read before the workspace is removed and carried
//! base64-encoded in the run report.

use super::reporter::ProgressReporter;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use playstack_common::events::PipelineStage;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const SCORE_DOWNLOAD_NAME: &str = "score.pdf";
pub const AUDIO_DOWNLOAD_NAME: &str = "instrumental.wav";
pub const MIDI_DOWNLOAD_NAME: &str = "instrumental.mid";

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const WAV_MEDIA_TYPE: &str = "audio/wav";
pub const MIDI_MEDIA_TYPE: &str = "audio/midi";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Score,
    Audio,
    Midi,
}

/// One download button
#[derive(Debug, Clone, Serialize)]
pub struct DownloadOffer {
    pub kind: ArtifactKind,
    pub label: String,
    pub filename: &'static str,
    pub media_type: &'static str,
    pub size_bytes: usize,
    /// Base64 (standard alphabet) file contents
    pub data: String,
}

/// Inline audio player
///
/// Plays the bytes of the download offer named by `artifact`; the audio is
/// carried once in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackWidget {
    pub media_type: &'static str,
    pub artifact: ArtifactKind,
}

impl PlaybackWidget {
    fn wav() -> Self {
        Self {
            media_type: WAV_MEDIA_TYPE,
            artifact: ArtifactKind::Audio,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Presentation {
    pub downloads: Vec<DownloadOffer>,
    pub playback: Option<PlaybackWidget>,
}

impl Presentation {
    pub fn offer(&self, kind: ArtifactKind) -> Option<&DownloadOffer> {
        self.downloads.iter().find(|d| d.kind == kind)
    }

    /// Download offer the playback widget points at
    pub fn playback_offer(&self) -> Option<&DownloadOffer> {
        self.playback.as_ref().and_then(|p| self.offer(p.artifact))
    }

    pub fn filenames(&self) -> Vec<String> {
        self.downloads.iter().map(|d| d.filename.to_string()).collect()
    }
}

/// Files left by the transcription pipeline; `None` means not produced
#[derive(Debug, Clone, Default)]
pub struct ProducedArtifacts {
    pub midi: Option<PathBuf>,
    pub score: Option<PathBuf>,
    pub audio: Option<PathBuf>,
}

async fn read_offer(
    kind: ArtifactKind,
    label: &str,
    path: &Path,
    filename: &'static str,
    media_type: &'static str,
) -> std::io::Result<DownloadOffer> {
    let bytes = tokio::fs::read(path).await?;
    Ok(DownloadOffer {
        kind,
        label: label.to_string(),
        filename,
        media_type,
        size_bytes: bytes.len(),
        data: STANDARD.encode(&bytes),
    })
}

/// Build the transcription result view
///
/// Score and audio are offered only when produced; the MIDI file is offered
/// whenever it exists, independent of the optional stages.
pub async fn present_transcription(
    artifacts: &ProducedArtifacts,
    reporter: &mut ProgressReporter,
) -> std::io::Result<Presentation> {
    let mut presentation = Presentation::default();

    if let Some(score) = artifacts.score.as_deref().filter(|p| p.is_file()) {
        let offer = read_offer(
            ArtifactKind::Score,
            "Download score (PDF)",
            score,
            SCORE_DOWNLOAD_NAME,
            PDF_MEDIA_TYPE,
        )
        .await?;
        presentation.downloads.push(offer);
    }

    match artifacts.audio.as_deref().filter(|p| p.is_file()) {
        Some(audio) => {
            let offer = read_offer(
                ArtifactKind::Audio,
                "Download instrumental (WAV)",
                audio,
                AUDIO_DOWNLOAD_NAME,
                WAV_MEDIA_TYPE,
            )
            .await?;
            presentation.downloads.push(offer);
            presentation.playback = Some(PlaybackWidget::wav());
        }
        None => reporter.info(
            PipelineStage::Present,
            "Audio rendering skipped. You can still download the MIDI file below.",
        ),
    }

    if let Some(midi) = artifacts.midi.as_deref().filter(|p| p.is_file()) {
        let offer = read_offer(
            ArtifactKind::Midi,
            "Download MIDI",
            midi,
            MIDI_DOWNLOAD_NAME,
            MIDI_MEDIA_TYPE,
        )
        .await?;
        presentation.downloads.push(offer);
    }

    Ok(presentation)
}

/// Build the vocal-remover result view
pub async fn present_instrumental(path: &Path) -> std::io::Result<Presentation> {
    let offer = read_offer(
        ArtifactKind::Audio,
        "Download Instrumental",
        path,
        AUDIO_DOWNLOAD_NAME,
        WAV_MEDIA_TYPE,
    )
    .await?;
    Ok(Presentation {
        downloads: vec![offer],
        playback: Some(PlaybackWidget::wav()),
    })
}
