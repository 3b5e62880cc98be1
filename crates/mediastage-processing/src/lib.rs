//! MediaStage attachment pipeline
//!
//! validate → stage (with previews) → upload → aggregate → merge into the
//! parent entity request.
//!
//! - [`FileValidator`] classifies candidate files under an [`UploadPolicy`](mediastage_core::UploadPolicy).
//! - [`PreviewManager`] owns the in-memory preview URLs of staged images.
//! - [`StagingArea`] is the picker's state: validated attachments and their previews.
//! - [`SubmissionBridge`] exposes a registered staging area to the dialog that submits the entity.
//! - [`UploadOrchestrator`] transfers files and [`aggregate`] reduces the results.
//! - [`SubmissionController`] runs one submission transaction end to end.

pub mod bridge;
pub mod preview;
pub mod staging;
pub mod upload;
pub mod validator;

pub use bridge::{BridgeRegistration, SharedStaging, SubmissionBridge};
pub use preview::{MemoryPreviewBackend, PreviewBackend, PreviewManager, PreviewRef};
pub use staging::{AttachmentId, PendingAttachment, StagingArea};
pub use upload::{
    aggregate, ProgressFn, SubmissionController, SubmitError, SubmitReport, UploadOrchestrator,
    UploadStrategy,
};
pub use validator::{FileValidator, ValidationError, ValidationOutcome};
