use serde::Serialize;

use super::file::CandidateFile;
use super::media::{MediaDescriptor, MediaKind};

/// Result of transferring one staged file. Immutable once produced.
#[derive(Clone, Debug)]
pub struct UploadResult {
    pub source_file: CandidateFile,
    pub success: bool,
    pub remote_url: Option<String>,
    pub error: Option<String>,
}

impl UploadResult {
    pub fn succeeded(source_file: CandidateFile, remote_url: impl Into<String>) -> Self {
        Self {
            source_file,
            success: true,
            remote_url: Some(remote_url.into()),
            error: None,
        }
    }

    pub fn failed(source_file: CandidateFile, error: impl Into<String>) -> Self {
        Self {
            source_file,
            success: false,
            remote_url: None,
            error: Some(error.into()),
        }
    }

    /// Descriptor for a successful result; `None` for failures.
    pub fn descriptor(&self) -> Option<MediaDescriptor> {
        if !self.success {
            return None;
        }
        let url = self.remote_url.clone()?;
        let mime_type = self.source_file.effective_mime_type();

        Some(MediaDescriptor {
            kind: MediaKind::from_mime_type(&mime_type),
            url,
            mime_type,
            filename: self.source_file.name.clone(),
            caption: None,
        })
    }
}

/// Outcome of one submission attempt. `success` holds iff `errors` is empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub success: bool,
    pub media: Vec<MediaDescriptor>,
    pub errors: Vec<String>,
}

impl BatchOutcome {
    /// Outcome of a batch with nothing to upload.
    pub fn empty() -> Self {
        Self {
            success: true,
            media: Vec::new(),
            errors: Vec::new(),
        }
    }
}
