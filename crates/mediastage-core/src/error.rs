//! Error types module
//!
//! Remote transfer errors and the metadata trait that lets front ends decide
//! how an error is shown to the user and logged. Local validation errors live
//! next to the validator in `mediastage-processing`.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a failed transfer
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Describes how an error should be presented.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "FILE_TOO_LARGE")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same action can succeed
    fn is_recoverable(&self) -> bool;

    /// User-facing message, shown inline or as a toast
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Failure transferring a single file to the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("File is too large for the server")]
    TooLarge,

    #[error("File type is not supported by the server")]
    UnsupportedMedia,

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Network error while uploading: {0}")]
    Network(String),

    #[error("Invalid response from upload server")]
    InvalidResponse,

    #[error("Upload cancelled")]
    Cancelled,
}

impl TransferError {
    /// Map a non-2xx status and optional server message to a transfer error.
    pub fn from_status(status: u16, server_message: Option<String>) -> Self {
        match status {
            413 => TransferError::TooLarge,
            415 => TransferError::UnsupportedMedia,
            _ => TransferError::Server {
                status,
                message: server_message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| format!("Upload failed (HTTP {})", status)),
            },
        }
    }
}

impl ErrorMetadata for TransferError {
    fn error_code(&self) -> &'static str {
        match self {
            TransferError::TooLarge => "PAYLOAD_TOO_LARGE",
            TransferError::UnsupportedMedia => "UNSUPPORTED_MEDIA_TYPE",
            TransferError::Server { .. } => "UPLOAD_FAILED",
            TransferError::Network(_) => "NETWORK_ERROR",
            TransferError::InvalidResponse => "INVALID_RESPONSE",
            TransferError::Cancelled => "UPLOAD_CANCELLED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            TransferError::TooLarge | TransferError::UnsupportedMedia => false,
            TransferError::Server { status, .. } => *status >= 500,
            TransferError::Network(_) | TransferError::InvalidResponse => true,
            TransferError::Cancelled => true,
        }
    }

    fn client_message(&self) -> String {
        match self {
            TransferError::Network(_) => "Network error while uploading".to_string(),
            other => other.to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            TransferError::Cancelled => LogLevel::Debug,
            TransferError::InvalidResponse => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }
}
