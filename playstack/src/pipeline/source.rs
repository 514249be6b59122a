//! Input source selection

use super::outcome::PipelineError;

/// Extensions accepted for uploads (lower-case, without dot)
pub const ACCEPTED_UPLOAD_EXTENSIONS: [&str; 2] = ["mp3", "wav"];

/// Extension used when the uploaded filename has none
pub const DEFAULT_UPLOAD_EXTENSION: &str = "wav";

/// Where a run's audio comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceReference {
    /// Remote video whose audio track is downloaded
    Remote { url: String },
    /// Bytes uploaded by the operator
    Upload {
        filename: Option<String>,
        bytes: Vec<u8>,
    },
}

impl SourceReference {
    /// Pick the active source from the submitted form fields
    ///
    /// A non-blank URL wins over an upload. With neither present the run
    /// cannot start.
    pub fn select(
        url: Option<String>,
        upload: Option<(Option<String>, Vec<u8>)>,
    ) -> Result<Self, PipelineError> {
        if let Some(url) = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            return Ok(SourceReference::Remote { url });
        }

        match upload {
            Some((filename, bytes)) => {
                upload_extension(filename.as_deref())?;
                Ok(SourceReference::Upload { filename, bytes })
            }
            None => Err(PipelineError::MissingSource),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SourceReference::Remote { url } => format!("remote {}", url),
            SourceReference::Upload { filename, bytes } => format!(
                "upload {} ({} bytes)",
                filename.as_deref().unwrap_or("<unnamed>"),
                bytes.len()
            ),
        }
    }
}

/// Extension (lower-case, without dot) under which an upload is stored
///
/// Files without an extension (including a trailing dot) are stored as
/// `.wav`; extensions other than `mp3` and `wav` are rejected.
pub fn upload_extension(filename: Option<&str>) -> Result<String, PipelineError> {
    let extension = filename
        .map(std::path::Path::new)
        .and_then(|p| p.extension())
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .filter(|e| !e.is_empty());

    match extension {
        None => Ok(DEFAULT_UPLOAD_EXTENSION.to_string()),
        Some(ext) if ACCEPTED_UPLOAD_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        Some(ext) => Err(PipelineError::UnsupportedUpload(ext)),
    }
}
