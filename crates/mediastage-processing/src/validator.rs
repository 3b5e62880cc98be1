use mediastage_core::format::size_limit_label;
use mediastage_core::{CandidateFile, ErrorMetadata, LogLevel, MediaKind, UploadPolicy};
use serde::Serialize;

/// Local validation errors for candidate files
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File type not allowed: {content_type}")]
    DeniedType {
        filename: String,
        content_type: String,
    },

    #[error("Unsupported file type: {content_type}")]
    UnsupportedType {
        filename: String,
        content_type: String,
    },

    #[error("File \"{filename}\" is empty")]
    EmptyFile { filename: String },

    #[error("File \"{filename}\" exceeds the {limit} per-file limit")]
    FileTooLarge {
        filename: String,
        size: u64,
        limit: String,
    },

    #[error("Adding \"{filename}\" would exceed the {limit} total upload limit")]
    BatchTooLarge {
        filename: String,
        staged: u64,
        limit: String,
    },
}

impl ErrorMetadata for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            ValidationError::DeniedType { .. } => "FILE_TYPE_DENIED",
            ValidationError::UnsupportedType { .. } => "UNSUPPORTED_FILE_TYPE",
            ValidationError::EmptyFile { .. } => "EMPTY_FILE",
            ValidationError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            ValidationError::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
        }
    }

    fn is_recoverable(&self) -> bool {
        // Removing other staged files makes room again.
        matches!(self, ValidationError::BatchTooLarge { .. })
    }

    fn client_message(&self) -> String {
        self.to_string()
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

/// Classification of a candidate file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub accepted: bool,
    pub kind: MediaKind,
    pub rejection_reason: Option<String>,
}

/// Candidate file validator
///
/// Pure over `(file, staged_total)`: holds only the immutable policy, so one
/// instance can be shared between threads and called repeatedly.
#[derive(Debug, Clone)]
pub struct FileValidator {
    policy: UploadPolicy,
}

impl FileValidator {
    pub fn new(policy: UploadPolicy) -> Self {
        Self { policy }
    }

    /// Validate the content type. The deny-list is checked first and wins
    /// over the allow-list.
    pub fn validate_type(&self, file: &CandidateFile) -> Result<MediaKind, ValidationError> {
        let content_type = file.effective_mime_type();

        let denied_extension = file
            .extension()
            .map(|ext| self.policy.denied_extensions.contains(&ext))
            .unwrap_or(false);
        let denied_type = self
            .policy
            .denied_content_types
            .iter()
            .any(|ct| ct == &content_type);

        if denied_type || denied_extension {
            return Err(ValidationError::DeniedType {
                filename: file.name.clone(),
                content_type: display_type(&content_type, file),
            });
        }

        if content_type.is_empty()
            || !self
                .policy
                .allowed_content_types
                .iter()
                .any(|ct| ct == &content_type)
        {
            return Err(ValidationError::UnsupportedType {
                filename: file.name.clone(),
                content_type: display_type(&content_type, file),
            });
        }

        Ok(MediaKind::from_mime_type(&content_type))
    }

    /// Validate the per-file ceiling. Zero-byte files are rejected.
    pub fn validate_file_size(&self, file: &CandidateFile) -> Result<(), ValidationError> {
        if file.size == 0 {
            return Err(ValidationError::EmptyFile {
                filename: file.name.clone(),
            });
        }

        if file.size > self.policy.max_file_size_bytes {
            return Err(ValidationError::FileTooLarge {
                filename: file.name.clone(),
                size: file.size,
                limit: size_limit_label(self.policy.max_file_size_bytes),
            });
        }

        Ok(())
    }

    /// Validate that adding the file keeps the staged total under the batch ceiling.
    pub fn validate_batch_size(
        &self,
        file: &CandidateFile,
        staged_total: u64,
    ) -> Result<(), ValidationError> {
        if staged_total.saturating_add(file.size) > self.policy.max_batch_size_bytes {
            return Err(ValidationError::BatchTooLarge {
                filename: file.name.clone(),
                staged: staged_total,
                limit: size_limit_label(self.policy.max_batch_size_bytes),
            });
        }

        Ok(())
    }

    /// Run every check in order: type, per-file size, aggregate size.
    pub fn check(
        &self,
        file: &CandidateFile,
        staged_total: u64,
    ) -> Result<MediaKind, ValidationError> {
        let kind = self.validate_type(file)?;
        self.validate_file_size(file)?;
        self.validate_batch_size(file, staged_total)?;
        Ok(kind)
    }

    /// Classify a candidate file. `staged_total` is the byte total of files
    /// already accepted into the same batch.
    pub fn validate(&self, file: &CandidateFile, staged_total: u64) -> ValidationOutcome {
        match self.check(file, staged_total) {
            Ok(kind) => ValidationOutcome {
                accepted: true,
                kind,
                rejection_reason: None,
            },
            Err(e) => ValidationOutcome {
                accepted: false,
                kind: file.kind(),
                rejection_reason: Some(e.to_string()),
            },
        }
    }
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new(UploadPolicy::default())
    }
}

fn display_type(content_type: &str, file: &CandidateFile) -> String {
    if !content_type.is_empty() {
        return content_type.to_string();
    }
    match file.extension() {
        Some(ext) => format!(".{}", ext),
        None => "unknown".to_string(),
    }
}
