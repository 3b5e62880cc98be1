//! Hand-off between a nested file picker and the dialog submitting the entity
//!
//! One [`SubmissionBridge`] is created per dialog and passed down to the
//! picker. The picker registers its staging area when it mounts and keeps the
//! returned [`BridgeRegistration`]; dropping it (unmount) deregisters. The
//! dialog reads a snapshot of the pending files at submit time and, once the
//! entity is saved, releases the attachments it submitted.

use mediastage_core::{CandidateFile, MediaDescriptor};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

use crate::staging::{AttachmentId, StagingArea};

/// Staging area shared between the picker and the bridge.
pub type SharedStaging = Arc<Mutex<StagingArea>>;

#[derive(Default)]
struct BridgeSlot {
    generation: u64,
    staging: Option<SharedStaging>,
}

#[derive(Clone, Default)]
pub struct SubmissionBridge {
    slot: Arc<Mutex<BridgeSlot>>,
}

impl SubmissionBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the picker's staging area, replacing any previous registration.
    pub fn register(&self, staging: SharedStaging) -> BridgeRegistration {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        slot.staging = Some(staging);

        BridgeRegistration {
            slot: Arc::downgrade(&self.slot),
            generation: slot.generation,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.slot.lock().staging.is_some()
    }

    fn staging(&self) -> Option<SharedStaging> {
        self.slot.lock().staging.clone()
    }

    /// Files waiting to be uploaded, as the picker shows them right now.
    /// Rejected and already uploaded entries are excluded.
    pub fn pending_files(&self) -> Vec<CandidateFile> {
        self.staging()
            .map(|s| s.lock().pending_files())
            .unwrap_or_default()
    }

    pub fn pending_entries(&self) -> Vec<(AttachmentId, CandidateFile)> {
        self.staging()
            .map(|s| s.lock().pending_entries())
            .unwrap_or_default()
    }

    /// Descriptors of files that uploaded in an earlier, partially failed attempt.
    pub fn known_good(&self) -> Vec<MediaDescriptor> {
        self.staging()
            .map(|s| s.lock().known_good())
            .unwrap_or_default()
    }

    pub fn uploaded_entries(&self) -> Vec<(AttachmentId, MediaDescriptor)> {
        self.staging()
            .map(|s| s.lock().uploaded_entries())
            .unwrap_or_default()
    }

    /// Rejected entries, shown with their reason but never uploaded.
    pub fn rejected_ids(&self) -> Vec<AttachmentId> {
        self.staging()
            .map(|s| s.lock().rejected().map(|a| a.id).collect())
            .unwrap_or_default()
    }

    /// Whether the attachment is still listed. `false` once the user removed it.
    pub fn contains(&self, id: AttachmentId) -> bool {
        self.staging()
            .map(|s| s.lock().contains(id))
            .unwrap_or(false)
    }

    pub fn mark_uploaded(&self, id: AttachmentId, descriptor: MediaDescriptor) -> bool {
        self.staging()
            .map(|s| s.lock().mark_uploaded(id, descriptor))
            .unwrap_or(false)
    }

    /// Remove the submitted attachments and release their previews. Files
    /// staged after the snapshot stay listed.
    pub fn release(&self, ids: &[AttachmentId]) -> usize {
        self.staging()
            .map(|s| s.lock().remove_all(ids))
            .unwrap_or(0)
    }

    /// Release all previews and empty the staging list. No-op when nothing
    /// is registered or staged.
    pub fn clear_pending(&self) {
        if let Some(staging) = self.staging() {
            staging.lock().clear();
        }
    }
}

impl std::fmt::Debug for SubmissionBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionBridge")
            .field("registered", &self.is_registered())
            .finish()
    }
}

/// Keeps a staging area registered until dropped.
#[derive(Debug)]
#[must_use = "dropping the registration deregisters the staging area"]
pub struct BridgeRegistration {
    slot: Weak<Mutex<BridgeSlot>>,
    generation: u64,
}

impl Drop for BridgeRegistration {
    fn drop(&mut self) {
        let Some(slot) = self.slot.upgrade() else {
            return;
        };
        let mut slot = slot.lock();
        // A newer registration owns the slot now.
        if slot.generation == self.generation {
            slot.staging = None;
        }
    }
}
