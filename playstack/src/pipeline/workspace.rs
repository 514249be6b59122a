//! Per-run scratch workspace
//!
//! Each run owns a freshly created temporary directory. All intermediate
//! and output files live inside it, and the directory is removed when the
//! [`Workspace`] is dropped, whether the run succeeded or not.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Downloaded audio
pub const DOWNLOAD_FILE: &str = "audio.wav";
/// Stem of an uploaded audio file (extension appended)
pub const UPLOAD_STEM: &str = "upload";
/// Canonical transcription output
pub const MIDI_FILE: &str = "transcription.mid";
/// LilyPond source produced from the MIDI file
pub const LILYPOND_FILE: &str = "score.ly";
/// Engraved score
pub const SCORE_FILE: &str = "score.pdf";
/// Synthesizer output
pub const RENDER_FILE: &str = "render.wav";
/// Vocal-remover output
pub const INSTRUMENTAL_FILE: &str = "instrumental.wav";

/// Temporary directory scoped to one run
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Allocate a new workspace under `scratch_root`
    pub fn create_in(scratch_root: &Path) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("playstack-")
            .tempdir_in(scratch_root)?;
        tracing::debug!(workspace = %dir.path().display(), "Workspace allocated");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn download_path(&self) -> PathBuf {
        self.file(DOWNLOAD_FILE)
    }

    pub fn midi_path(&self) -> PathBuf {
        self.file(MIDI_FILE)
    }

    pub fn score_path(&self) -> PathBuf {
        self.file(SCORE_FILE)
    }

    pub fn render_path(&self) -> PathBuf {
        self.file(RENDER_FILE)
    }

    pub fn instrumental_path(&self) -> PathBuf {
        self.file(INSTRUMENTAL_FILE)
    }

    /// All `.mid` / `.midi` files currently in the workspace, sorted by path
    pub fn midi_files(&self) -> io::Result<BTreeSet<PathBuf>> {
        let mut found = BTreeSet::new();
        for entry in std::fs::read_dir(self.path())? {
            let path = entry?.path();
            let is_midi = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("mid") || e.eq_ignore_ascii_case("midi"))
                .unwrap_or(false);
            if is_midi && path.is_file() {
                found.insert(path);
            }
        }
        Ok(found)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        tracing::debug!(workspace = %self.dir.path().display(), "Removing workspace");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_removed_on_drop() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::create_in(root.path()).unwrap();
        let path = ws.path().to_path_buf();
        std::fs::write(ws.midi_path(), b"MThd").unwrap();
        assert!(path.is_dir());

        drop(ws);
        assert!(!path.exists());
    }

    #[test]
    fn test_midi_files_lists_only_midi_extensions() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::create_in(root.path()).unwrap();
        std::fs::write(ws.file("a.mid"), b"").unwrap();
        std::fs::write(ws.file("b.MIDI"), b"").unwrap();
        std::fs::write(ws.file("audio.wav"), b"").unwrap();

        let names: Vec<String> = ws
            .midi_files()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.mid", "b.MIDI"]);
    }

    #[test]
    fn test_workspaces_are_distinct() {
        let root = TempDir::new().unwrap();
        let a = Workspace::create_in(root.path()).unwrap();
        let b = Workspace::create_in(root.path()).unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("playstack-"));
    }
}
