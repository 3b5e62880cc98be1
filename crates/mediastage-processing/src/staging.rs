//! Staging list of the file picker
//!
//! Holds the validated, not yet submitted attachments of one picker together
//! with their preview references. Rejected files stay listed with their
//! reason so the picker can show it inline, but they are never uploaded.

use mediastage_core::{CandidateFile, MediaDescriptor, MediaKind, UploadPolicy};
use std::sync::Arc;

use crate::preview::{MemoryPreviewBackend, PreviewBackend, PreviewManager, PreviewRef};
use crate::validator::{FileValidator, ValidationOutcome};

/// Identifier of an attachment within one staging area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentId(u64);

impl std::fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct PendingAttachment {
    pub id: AttachmentId,
    pub file: CandidateFile,
    pub kind: MediaKind,
    pub preview: Option<PreviewRef>,
    pub rejection_reason: Option<String>,
    /// Set once the file uploaded successfully in a partially failed attempt.
    pub uploaded: Option<MediaDescriptor>,
}

impl PendingAttachment {
    pub fn is_rejected(&self) -> bool {
        self.rejection_reason.is_some()
    }

    /// Accepted and not uploaded yet.
    pub fn is_pending(&self) -> bool {
        !self.is_rejected() && self.uploaded.is_none()
    }
}

#[derive(Debug)]
pub struct StagingArea {
    validator: FileValidator,
    previews: PreviewManager,
    attachments: Vec<PendingAttachment>,
    next_id: u64,
}

impl StagingArea {
    pub fn new(policy: UploadPolicy) -> Self {
        Self::with_preview_backend(policy, Arc::new(MemoryPreviewBackend::new()))
    }

    pub fn with_preview_backend(policy: UploadPolicy, backend: Arc<dyn PreviewBackend>) -> Self {
        Self {
            validator: FileValidator::new(policy),
            previews: PreviewManager::new(backend),
            attachments: Vec::new(),
            next_id: 1,
        }
    }

    /// Validate and stage files in order. Each file is checked against the
    /// running total of accepted files, including those added earlier in the
    /// same call.
    pub fn add_files<I>(&mut self, files: I) -> Vec<ValidationOutcome>
    where
        I: IntoIterator<Item = CandidateFile>,
    {
        let mut outcomes = Vec::new();

        for file in files {
            let outcome = self.validator.validate(&file, self.total_accepted_bytes());

            let preview = if outcome.accepted {
                self.previews.acquire(&file, outcome.kind)
            } else {
                tracing::debug!(
                    filename = %file.name,
                    reason = outcome.rejection_reason.as_deref().unwrap_or_default(),
                    "File rejected"
                );
                None
            };

            let id = AttachmentId(self.next_id);
            self.next_id += 1;

            self.attachments.push(PendingAttachment {
                id,
                file,
                kind: outcome.kind,
                preview,
                rejection_reason: outcome.rejection_reason.clone(),
                uploaded: None,
            });
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Remove one attachment and release its preview.
    pub fn remove(&mut self, id: AttachmentId) -> bool {
        let Some(index) = self.attachments.iter().position(|a| a.id == id) else {
            return false;
        };

        let attachment = self.attachments.remove(index);
        if let Some(preview) = &attachment.preview {
            self.previews.release_one(preview);
        }
        true
    }

    /// Remove the listed attachments and release exactly their previews.
    /// Unknown ids are skipped. Returns how many were removed.
    pub fn remove_all(&mut self, ids: &[AttachmentId]) -> usize {
        ids.iter().filter(|id| self.remove(**id)).count()
    }

    /// Drop every attachment and release all previews. Safe to repeat.
    pub fn clear(&mut self) {
        self.previews.release_all();
        self.attachments.clear();
    }

    /// Record the descriptor of an attachment that uploaded successfully.
    pub fn mark_uploaded(&mut self, id: AttachmentId, descriptor: MediaDescriptor) -> bool {
        match self
            .attachments
            .iter_mut()
            .find(|a| a.id == id && !a.is_rejected())
        {
            Some(attachment) => {
                attachment.uploaded = Some(descriptor);
                true
            }
            None => false,
        }
    }

    /// Files still waiting to be uploaded, in staging order.
    pub fn pending_files(&self) -> Vec<CandidateFile> {
        self.pending_entries().into_iter().map(|(_, f)| f).collect()
    }

    pub fn pending_entries(&self) -> Vec<(AttachmentId, CandidateFile)> {
        self.attachments
            .iter()
            .filter(|a| a.is_pending())
            .map(|a| (a.id, a.file.clone()))
            .collect()
    }

    /// Descriptors of attachments uploaded in an earlier attempt.
    pub fn known_good(&self) -> Vec<MediaDescriptor> {
        self.uploaded_entries().into_iter().map(|(_, d)| d).collect()
    }

    /// Uploaded attachments with their descriptors, in staging order.
    pub fn uploaded_entries(&self) -> Vec<(AttachmentId, MediaDescriptor)> {
        self.attachments
            .iter()
            .filter_map(|a| a.uploaded.clone().map(|d| (a.id, d)))
            .collect()
    }

    pub fn total_accepted_bytes(&self) -> u64 {
        self.attachments
            .iter()
            .filter(|a| !a.is_rejected())
            .map(|a| a.file.size)
            .sum()
    }

    pub fn attachments(&self) -> &[PendingAttachment] {
        &self.attachments
    }

    pub fn contains(&self, id: AttachmentId) -> bool {
        self.attachments.iter().any(|a| a.id == id)
    }

    pub fn accepted(&self) -> impl Iterator<Item = &PendingAttachment> {
        self.attachments.iter().filter(|a| !a.is_rejected())
    }

    pub fn rejected(&self) -> impl Iterator<Item = &PendingAttachment> {
        self.attachments.iter().filter(|a| a.is_rejected())
    }

    pub fn live_previews(&self) -> usize {
        self.previews.live_count()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }
}

impl Default for StagingArea {
    fn default() -> Self {
        Self::new(UploadPolicy::default())
    }
}
