//! Local preview references for staged images
//!
//! A preview is a `blob:` URL resolving to the image bytes held in memory,
//! used for thumbnails while the file is staged. Every acquired reference is
//! released exactly once: on explicit removal ([`PreviewManager::release_one`]),
//! on batch clear ([`PreviewManager::release_all`]) or when the manager is
//! dropped with its owner.

use bytes::Bytes;
use mediastage_core::{CandidateFile, MediaKind};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// Opaque handle to a live preview URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewRef {
    url: String,
}

impl PreviewRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Creates and revokes preview URLs.
pub trait PreviewBackend: Send + Sync {
    fn create(&self, file: &CandidateFile) -> PreviewRef;

    fn revoke(&self, preview: &PreviewRef);
}

/// Keeps preview bytes in memory, keyed by `blob:mediastage/<uuid>`.
#[derive(Debug, Default)]
pub struct MemoryPreviewBackend {
    blobs: Mutex<HashMap<String, Bytes>>,
}

impl MemoryPreviewBackend {
    pub const URL_PREFIX: &'static str = "blob:mediastage/";

    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes behind a live preview URL.
    pub fn resolve(&self, url: &str) -> Option<Bytes> {
        self.blobs.lock().get(url).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.blobs.lock().len()
    }
}

impl PreviewBackend for MemoryPreviewBackend {
    fn create(&self, file: &CandidateFile) -> PreviewRef {
        let url = format!("{}{}", Self::URL_PREFIX, Uuid::new_v4());
        self.blobs.lock().insert(url.clone(), file.data.clone());
        PreviewRef::new(url)
    }

    fn revoke(&self, preview: &PreviewRef) {
        self.blobs.lock().remove(preview.url());
    }
}

/// Owns the live previews of one staging area.
pub struct PreviewManager {
    backend: Arc<dyn PreviewBackend>,
    live: HashSet<PreviewRef>,
}

impl PreviewManager {
    pub fn new(backend: Arc<dyn PreviewBackend>) -> Self {
        Self {
            backend,
            live: HashSet::new(),
        }
    }

    /// Acquire a preview for an image. Other kinds get none.
    pub fn acquire(&mut self, file: &CandidateFile, kind: MediaKind) -> Option<PreviewRef> {
        if kind != MediaKind::Image {
            return None;
        }

        let preview = self.backend.create(file);
        self.live.insert(preview.clone());
        tracing::trace!(url = %preview.url(), filename = %file.name, "Preview acquired");
        Some(preview)
    }

    /// Release one preview. Returns `false` if it was not live.
    pub fn release_one(&mut self, preview: &PreviewRef) -> bool {
        if !self.live.remove(preview) {
            return false;
        }

        self.backend.revoke(preview);
        tracing::trace!(url = %preview.url(), "Preview released");
        true
    }

    /// Release every live preview. Returns how many were released.
    pub fn release_all(&mut self) -> usize {
        let released = self.live.len();
        for preview in self.live.drain() {
            self.backend.revoke(&preview);
        }
        if released > 0 {
            tracing::trace!(released, "Previews released");
        }
        released
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

impl Drop for PreviewManager {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl std::fmt::Debug for PreviewManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewManager")
            .field("live", &self.live.len())
            .finish()
    }
}
