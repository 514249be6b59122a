//! Stage results and fatal pipeline errors

use std::path::PathBuf;
use thiserror::Error;

/// Result of a pipeline stage
///
/// `Recoverable` lets the caller try a fallback or skip an optional
/// artifact; `Fatal` stops the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<T> {
    Success(T),
    Recoverable(String),
    Fatal(String),
}

impl<T> StageOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, StageOutcome::Success(_))
    }

    /// Produced value, discarding any failure reason
    pub fn artifact(self) -> Option<T> {
        match self {
            StageOutcome::Success(value) => Some(value),
            StageOutcome::Recoverable(_) | StageOutcome::Fatal(_) => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            StageOutcome::Success(_) => None,
            StageOutcome::Recoverable(reason) | StageOutcome::Fatal(reason) => Some(reason),
        }
    }
}

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Neither a URL nor an upload was supplied
    #[error("Please provide a YouTube URL or upload a file.")]
    MissingSource,

    /// Vocal-remover run submitted without a URL
    #[error("Please provide a YouTube URL.")]
    MissingUrl,

    /// Upload extension outside the accepted audio types
    #[error("Unsupported upload type '{0}'. Upload an MP3 or WAV file.")]
    UnsupportedUpload(String),

    /// External tool exited non-zero; output is carried verbatim
    #[error("{}", describe_tool_failure(.tool, .exit_code, .stdout, .stderr, .hint))]
    ToolFailed {
        tool: String,
        exit_code: String,
        stdout: String,
        stderr: String,
        hint: Option<&'static str>,
    },

    /// External tool could not be started
    #[error("{tool} could not be started: {source}. Is {tool} installed?")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// Tool reported success but the expected file is absent
    #[error("{tool} finished but produced no output at {}", .path.display())]
    MissingOutput { tool: String, path: PathBuf },

    /// Both transcription attempts failed
    #[error("Transcription failed: {0}")]
    Transcription(String),

    /// Workspace allocation or file I/O
    #[error("Workspace I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Format a failed tool run the way the operator sees it
///
/// ```text
/// yt-dlp failed (exit code 1). Is the link valid and yt-dlp installed?
///
/// --- yt-dlp STDOUT ---
/// ...
/// --- yt-dlp STDERR ---
/// ...
/// ```
/// Empty streams are omitted.
fn describe_tool_failure(
    tool: &str,
    exit_code: &str,
    stdout: &str,
    stderr: &str,
    hint: &Option<&'static str>,
) -> String {
    let mut message = format!("{} failed (exit code {}).", tool, exit_code);
    if let Some(hint) = hint {
        message.push(' ');
        message.push_str(hint);
    }
    message.push('\n');
    if !stdout.trim().is_empty() {
        message.push_str(&format!("\n--- {} STDOUT ---\n{}", tool, stdout.trim()));
    }
    if !stderr.trim().is_empty() {
        message.push_str(&format!("\n--- {} STDERR ---\n{}", tool, stderr.trim()));
    }
    message
}
