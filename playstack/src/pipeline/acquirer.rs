//! Audio acquisition: remote download or saved upload

use super::outcome::PipelineError;
use super::process::{CommandRunner, Invocation};
use super::reporter::ProgressReporter;
use super::source::{upload_extension, SourceReference};
use super::workspace::{Workspace, UPLOAD_STEM};
use playstack_common::events::PipelineStage;
use std::path::PathBuf;
use std::sync::Arc;

const DOWNLOAD_HINT: &str = "Is the link valid and yt-dlp installed?";

/// Produces the run's waveform file inside the workspace
pub struct AudioAcquirer {
    runner: Arc<dyn CommandRunner>,
    yt_dlp: String,
}

impl AudioAcquirer {
    pub fn new(runner: Arc<dyn CommandRunner>, yt_dlp: impl Into<String>) -> Self {
        Self {
            runner,
            yt_dlp: yt_dlp.into(),
        }
    }

    pub async fn acquire(
        &self,
        source: &SourceReference,
        workspace: &Workspace,
        reporter: &mut ProgressReporter,
    ) -> Result<PathBuf, PipelineError> {
        match source {
            SourceReference::Remote { url } => {
                reporter.info(PipelineStage::Acquire, "Downloading YouTube audio…");
                self.download(url, workspace).await
            }
            SourceReference::Upload { filename, bytes } => {
                reporter.info(PipelineStage::Acquire, "Saving uploaded file…");
                save_upload(filename.as_deref(), bytes, workspace).await
            }
        }
    }

    /// Download the audio track of `url` as `audio.wav`
    ///
    /// The certificate and legacy-connection flags only work around an
    /// unreliable remote service.
    pub async fn download(&self, url: &str, workspace: &Workspace) -> Result<PathBuf, PipelineError> {
        let wav_path = workspace.download_path();
        let invocation = Invocation::new(&self.yt_dlp)
            .args([
                "--verbose",
                "--legacy-server-connect",
                "--no-check-certificates",
                "--prefer-insecure",
                "-x",
                "--audio-format",
                "wav",
            ])
            .arg(url)
            .arg("-o")
            .arg(&wav_path);

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|source| PipelineError::ToolUnavailable {
                tool: "yt-dlp".to_string(),
                source,
            })?;

        if !output.is_success() {
            return Err(PipelineError::ToolFailed {
                tool: "yt-dlp".to_string(),
                exit_code: output.exit_code_display(),
                stdout: output.stdout,
                stderr: output.stderr,
                hint: Some(DOWNLOAD_HINT),
            });
        }

        if !wav_path.is_file() {
            return Err(PipelineError::MissingOutput {
                tool: "yt-dlp".to_string(),
                path: wav_path,
            });
        }

        tracing::info!(url = %url, path = %wav_path.display(), "Remote audio downloaded");
        Ok(wav_path)
    }
}

/// Write uploaded bytes verbatim to `upload.<ext>`
pub async fn save_upload(
    filename: Option<&str>,
    bytes: &[u8],
    workspace: &Workspace,
) -> Result<PathBuf, PipelineError> {
    let extension = upload_extension(filename)?;
    let path = workspace.file(&format!("{}.{}", UPLOAD_STEM, extension));
    tokio::fs::write(&path, bytes).await?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "Upload saved");
    Ok(path)
}
