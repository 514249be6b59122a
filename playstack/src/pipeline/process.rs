//! External process invocation
//!
//! Every external tool (yt-dlp, basic-pitch, python, midi2ly, lilypond,
//! fluidsynth, ffmpeg) is run through the [`CommandRunner`] trait so stages
//! can be exercised against scripted runners in tests.
//!
//! Invocations block the run until the child exits. No timeout is applied.

use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;

/// A fully specified external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Arguments as lossy UTF-8, for logging and assertions
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Value following `flag` in the argument list, if any
    pub fn value_after(&self, flag: &str) -> Option<PathBuf> {
        let pos = self.args.iter().position(|a| a == flag)?;
        self.args.get(pos + 1).map(PathBuf::from)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.arg_strings() {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished child process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the child was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            exit_code: Some(0),
            ..Default::default()
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Exit code rendered for messages ("signal" when killed)
    pub fn exit_code_display(&self) -> String {
        self.exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string())
    }
}

/// Runs external commands to completion
///
/// `Err` means the process could not be started at all (typically
/// `ErrorKind::NotFound` for a missing binary). A started process that
/// exits non-zero is `Ok` with the captured output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput>;

    /// Whether `program` can be started at all
    async fn is_available(&self, program: &str, probe_arg: &str) -> bool {
        self.run(&Invocation::new(program).arg(probe_arg))
            .await
            .is_ok()
    }
}

/// [`CommandRunner`] backed by `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        tracing::debug!(command = %invocation, "Spawning external command");

        let mut command = tokio::process::Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &invocation.current_dir {
            command.current_dir(dir);
        }

        let output = command.output().await?;

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        tracing::debug!(
            program = %invocation.program,
            exit_code = %result.exit_code_display(),
            "External command finished"
        );

        Ok(result)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_builder_and_display() {
        let inv = Invocation::new("fluidsynth")
            .arg("-ni")
            .args(["bank.sf2", "song.mid"])
            .arg("-F")
            .arg("/tmp/out.wav");

        assert_eq!(inv.to_string(), "fluidsynth -ni bank.sf2 song.mid -F /tmp/out.wav");
        assert_eq!(inv.value_after("-F"), Some(PathBuf::from("/tmp/out.wav")));
        assert_eq!(inv.value_after("-r"), None);
    }

    #[test]
    fn test_command_output_success_requires_zero_exit() {
        assert!(CommandOutput::success().is_success());
        assert!(!CommandOutput::failure(1, "bad").is_success());

        let killed = CommandOutput {
            exit_code: None,
            ..Default::default()
        };
        assert!(!killed.is_success());
        assert_eq!(killed.exit_code_display(), "signal");
    }

    #[tokio::test]
    async fn test_system_runner_reports_missing_binary() {
        let runner = SystemCommandRunner;
        let result = runner
            .run(&Invocation::new("playstack-definitely-not-installed-tool"))
            .await;
        assert_eq!(
            result.unwrap_err().kind(),
            std::io::ErrorKind::NotFound
        );
        assert!(
            !runner
                .is_available("playstack-definitely-not-installed-tool", "--version")
                .await
        );
    }
}
