//! Upload pipeline: transfer staged files → aggregate → submit the entity.

mod aggregate;
mod orchestrator;
mod submission;

pub use aggregate::aggregate;
pub use orchestrator::{ProgressFn, UploadOrchestrator, UploadStrategy};
pub use submission::{SubmissionController, SubmitError, SubmitReport};
