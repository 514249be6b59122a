//! Center-channel suppression with ffmpeg
//!
//! `left' = left - right`, `right' = right - left`: anything panned dead
//! center (usually the lead vocal) cancels out.

use super::outcome::PipelineError;
use super::process::{CommandRunner, Invocation};
use std::path::Path;
use std::sync::Arc;

/// ffmpeg audio filter performing the channel subtraction
pub const CHANNEL_SUBTRACTION_FILTER: &str = "pan=stereo|c0=c0-c1|c1=c1-c0";

pub struct VocalRemover {
    runner: Arc<dyn CommandRunner>,
    ffmpeg: String,
}

impl VocalRemover {
    pub fn new(runner: Arc<dyn CommandRunner>, ffmpeg: impl Into<String>) -> Self {
        Self {
            runner,
            ffmpeg: ffmpeg.into(),
        }
    }

    /// The exact ffmpeg command for `input` → `output`
    pub fn invocation(&self, input: &Path, output: &Path) -> Invocation {
        Invocation::new(&self.ffmpeg)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-af")
            .arg(CHANNEL_SUBTRACTION_FILTER)
            .arg(output)
    }

    pub async fn remove_vocals(&self, input: &Path, output: &Path) -> Result<(), PipelineError> {
        let result = self
            .runner
            .run(&self.invocation(input, output))
            .await
            .map_err(|source| PipelineError::ToolUnavailable {
                tool: "ffmpeg".to_string(),
                source,
            })?;

        if !result.is_success() {
            return Err(PipelineError::ToolFailed {
                tool: "ffmpeg".to_string(),
                exit_code: result.exit_code_display(),
                stdout: result.stdout,
                stderr: result.stderr,
                hint: None,
            });
        }
        if !output.is_file() {
            return Err(PipelineError::MissingOutput {
                tool: "ffmpeg".to_string(),
                path: output.to_path_buf(),
            });
        }

        tracing::info!(output = %output.display(), "Vocals removed");
        Ok(())
    }
}
