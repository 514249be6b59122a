//! Audio processing pipelines
//!
//! Stages run sequentially inside a per-run [`workspace::Workspace`] and
//! shell out to external tools through [`process::CommandRunner`].

pub mod acquirer;
pub mod engraver;
pub mod outcome;
pub mod presenter;
pub mod process;
pub mod reporter;
pub mod runner;
pub mod source;
pub mod synthesizer;
pub mod transcriber;
pub mod vocal_remover;
pub mod workspace;

pub use outcome::{PipelineError, StageOutcome};
pub use presenter::{ArtifactKind, DownloadOffer, PlaybackWidget, Presentation};
pub use process::{CommandOutput, CommandRunner, Invocation, SystemCommandRunner};
pub use runner::{PipelineContext, RunReport, RunStatus, TranscriptionRequest};
