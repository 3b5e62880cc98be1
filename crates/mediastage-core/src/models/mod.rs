//! Data models for the attachment pipeline
//!
//! Each sub-module covers one stage of an attachment's life: the candidate
//! file picked by the user, the media descriptors persisted on the parent
//! entity, and the per-file and per-batch upload results.

mod file;
mod media;
mod upload;

pub use file::CandidateFile;
pub use media::{MediaDescriptor, MediaKind};
pub use upload::{BatchOutcome, UploadResult};
