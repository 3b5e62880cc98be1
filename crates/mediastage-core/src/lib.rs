//! MediaStage Core Library
//!
//! This crate provides the domain models, error types, configuration and the
//! collaborator traits shared by every MediaStage component: the attachment
//! pipeline in `mediastage-processing`, the HTTP client and the CLI.

pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod transport;

// Re-export commonly used types
pub use config::{AuthScheme, MediaStageConfig, UploadPolicy};
pub use error::{ErrorMetadata, LogLevel, TransferError};
pub use models::{
    BatchOutcome, CandidateFile, MediaDescriptor, MediaKind, UploadResult,
};
pub use transport::{EntityRequest, EntitySubmitter, SubmitMode, UploadTransport};
