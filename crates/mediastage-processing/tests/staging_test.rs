//! Preview lifecycle across picker mount, removal, submit and teardown.
//!
//! Run with: `cargo test -p mediastage-processing --test staging_test`

mod helpers;

use helpers::fixtures::{pdf, png};
use helpers::submitter::RecordingSubmitter;
use helpers::transport::ScriptedTransport;
use helpers::TestPicker;
use mediastage_core::{CandidateFile, EntityRequest};
use mediastage_processing::{
    MemoryPreviewBackend, PreviewBackend, PreviewRef, SubmissionBridge, SubmissionController,
    UploadOrchestrator,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct CountingBackend {
    inner: MemoryPreviewBackend,
    released: AtomicUsize,
}

impl PreviewBackend for CountingBackend {
    fn create(&self, file: &CandidateFile) -> PreviewRef {
        self.inner.create(file)
    }

    fn revoke(&self, preview: &PreviewRef) {
        self.released.fetch_add(1, Ordering::SeqCst);
        self.inner.revoke(preview);
    }
}

#[test]
fn test_remove_then_clear_releases_each_preview_once() {
    let backend = Arc::new(CountingBackend::default());
    let bridge = SubmissionBridge::new();
    let picker = TestPicker::mount_with_backend(
        &bridge,
        backend.clone(),
        vec![png("a.png"), png("b.png"), png("c.png")],
    );
    assert_eq!(backend.inner.live_count(), 3);

    let second = picker.staging.lock().attachments()[1].id;
    assert!(picker.staging.lock().remove(second));
    bridge.clear_pending();
    bridge.clear_pending();

    drop(picker);
    assert_eq!(backend.released.load(Ordering::SeqCst), 3);
    assert_eq!(backend.inner.live_count(), 0);
}

#[test]
fn test_unmount_releases_previews_and_deregisters() {
    let backend = Arc::new(CountingBackend::default());
    let bridge = SubmissionBridge::new();
    let picker = TestPicker::mount_with_backend(
        &bridge,
        backend.clone(),
        vec![png("a.png"), pdf("b.pdf")],
    );
    assert_eq!(bridge.pending_files().len(), 2);

    drop(picker);
    assert!(!bridge.is_registered());
    assert!(bridge.pending_files().is_empty());
    // Only the image had a preview.
    assert_eq!(backend.released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_successful_submit_releases_previews_before_returning() {
    let backend = Arc::new(CountingBackend::default());
    let bridge = SubmissionBridge::new();
    let picker = TestPicker::mount_with_backend(
        &bridge,
        backend.clone(),
        vec![png("a.png"), png("b.png")],
    );

    let controller = SubmissionController::new(
        bridge.clone(),
        UploadOrchestrator::new(ScriptedTransport::new()),
        RecordingSubmitter::new(),
    );
    controller
        .submit(EntityRequest::create("/bundles"), None)
        .await
        .unwrap();

    assert_eq!(backend.released.load(Ordering::SeqCst), 2);
    assert_eq!(picker.staging.lock().live_previews(), 0);

    drop(picker);
    assert_eq!(backend.released.load(Ordering::SeqCst), 2);
}

#[test]
fn test_rejected_files_stay_listed_but_not_pending() {
    let bridge = SubmissionBridge::new();
    let picker = TestPicker::mount(
        &bridge,
        vec![
            png("a.png"),
            CandidateFile::new("setup.exe", "application/x-msdownload", vec![1u8; 4]),
            CandidateFile::new("empty.txt", "text/plain", Vec::new()),
        ],
    );

    assert_eq!(picker.staged_names(), vec!["a.png", "setup.exe", "empty.txt"]);
    let pending: Vec<String> = bridge.pending_files().into_iter().map(|f| f.name).collect();
    assert_eq!(pending, vec!["a.png"]);
}
