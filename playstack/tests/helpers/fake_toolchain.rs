//! Scripted stand-in for the external tools
//!
//! Each tool either writes the file the real tool would write, or exits
//! non-zero with a recognizable stderr line. Every invocation is recorded.

use async_trait::async_trait;
use playstack::pipeline::{CommandOutput, CommandRunner, Invocation};
use std::io::{Error, ErrorKind};
use std::path::PathBuf;
use std::sync::Mutex;

use super::fixtures::{generate_test_midi, generate_test_wav};

/// What a fake tool does when invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Write the expected output and exit 0
    Succeed,
    /// Exit 1 without output
    Fail,
    /// Cannot be started (not installed)
    Missing,
}

pub struct FakeToolchain {
    pub downloader: Behavior,
    pub basic_pitch: Behavior,
    pub python: Behavior,
    pub engraver: Behavior,
    pub fluidsynth: Behavior,
    pub ffmpeg: Behavior,
    calls: Mutex<Vec<Invocation>>,
}

impl Default for FakeToolchain {
    fn default() -> Self {
        Self::all(Behavior::Succeed)
    }
}

impl FakeToolchain {
    pub fn all(behavior: Behavior) -> Self {
        Self {
            downloader: behavior,
            basic_pitch: behavior,
            python: behavior,
            engraver: behavior,
            fluidsynth: behavior,
            ffmpeg: behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }

    pub fn was_called(&self, program: &str) -> bool {
        self.programs().iter().any(|p| p == program)
    }

    fn behavior(&self, program: &str) -> Behavior {
        match program {
            "yt-dlp" => self.downloader,
            "basic-pitch" => self.basic_pitch,
            "python3" => self.python,
            "midi2ly" | "lilypond" => self.engraver,
            "fluidsynth" => self.fluidsynth,
            "ffmpeg" => self.ffmpeg,
            other => panic!("unexpected program {}", other),
        }
    }
}

/// File the real tool would write for this invocation
fn output_of(invocation: &Invocation) -> (PathBuf, Vec<u8>) {
    let args = invocation.arg_strings();
    let output_flag = || {
        args.iter()
            .find_map(|a| a.strip_prefix("--output="))
            .map(PathBuf::from)
            .unwrap()
    };

    match invocation.program.as_str() {
        "yt-dlp" => (invocation.value_after("-o").unwrap(), generate_test_wav(0.25)),
        // basic-pitch <dir> <audio>: names its output after the audio stem
        "basic-pitch" => {
            let stem = PathBuf::from(&args[1])
                .file_stem()
                .unwrap()
                .to_string_lossy()
                .into_owned();
            let dir = PathBuf::from(&args[0]);
            (dir.join(format!("{}_basic_pitch.mid", stem)), generate_test_midi())
        }
        // python3 -c SCRIPT <audio> <out> ...
        "python3" => (PathBuf::from(&args[3]), generate_test_midi()),
        "midi2ly" => (output_flag(), b"\\score { }".to_vec()),
        "lilypond" => (output_flag().with_extension("pdf"), b"%PDF-1.4 test".to_vec()),
        "fluidsynth" => (invocation.value_after("-F").unwrap(), generate_test_wav(0.25)),
        "ffmpeg" => (PathBuf::from(args.last().unwrap()), generate_test_wav(0.25)),
        other => panic!("unexpected program {}", other),
    }
}

#[async_trait]
impl CommandRunner for FakeToolchain {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        match self.behavior(&invocation.program) {
            Behavior::Succeed => {
                let (path, bytes) = output_of(invocation);
                std::fs::write(path, bytes)?;
                Ok(CommandOutput::success())
            }
            Behavior::Fail => Ok(CommandOutput::failure(
                1,
                format!("{}: simulated failure", invocation.program),
            )),
            Behavior::Missing => Err(Error::new(ErrorKind::NotFound, "No such file or directory")),
        }
    }

    async fn is_available(&self, program: &str, _probe_arg: &str) -> bool {
        self.behavior(program) != Behavior::Missing
    }
}
