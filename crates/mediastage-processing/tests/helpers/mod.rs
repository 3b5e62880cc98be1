//! Test helpers: scripted collaborators and staged pickers for pipeline tests.
//!
//! Run from workspace root: `cargo test -p mediastage-processing`.

pub mod fixtures;
pub mod submitter;
pub mod transport;

use mediastage_core::{CandidateFile, UploadPolicy};
use mediastage_processing::{
    BridgeRegistration, PreviewBackend, SharedStaging, StagingArea, SubmissionBridge,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// A mounted picker: its staging area and the registration keeping it on the bridge.
pub struct TestPicker {
    pub staging: SharedStaging,
    pub registration: BridgeRegistration,
}

impl TestPicker {
    /// Mount a picker on `bridge` and stage `files`.
    pub fn mount(bridge: &SubmissionBridge, files: Vec<CandidateFile>) -> Self {
        Self::mount_with(bridge, StagingArea::default(), files)
    }

    pub fn mount_with_backend(
        bridge: &SubmissionBridge,
        backend: Arc<dyn PreviewBackend>,
        files: Vec<CandidateFile>,
    ) -> Self {
        Self::mount_with(
            bridge,
            StagingArea::with_preview_backend(UploadPolicy::default(), backend),
            files,
        )
    }

    fn mount_with(
        bridge: &SubmissionBridge,
        mut staging: StagingArea,
        files: Vec<CandidateFile>,
    ) -> Self {
        staging.add_files(files);
        let staging = Arc::new(Mutex::new(staging));
        let registration = bridge.register(staging.clone());
        Self {
            staging,
            registration,
        }
    }

    pub fn staged_names(&self) -> Vec<String> {
        self.staging
            .lock()
            .attachments()
            .iter()
            .map(|a| a.file.name.clone())
            .collect()
    }
}
