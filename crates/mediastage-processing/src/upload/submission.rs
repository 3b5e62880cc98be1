use mediastage_core::{
    BatchOutcome, EntityRequest, EntitySubmitter, ErrorMetadata, LogLevel, MediaDescriptor,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::aggregate::aggregate;
use super::orchestrator::{ProgressFn, UploadOrchestrator};
use crate::bridge::SubmissionBridge;
use crate::staging::AttachmentId;

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("A submission is already in progress")]
    InFlight,

    #[error("Some files failed to upload: {}", .errors.join("; "))]
    Upload { errors: Vec<String> },

    #[error("Invalid entity payload: {0}")]
    Payload(#[source] anyhow::Error),

    #[error("Entity request failed: {0}")]
    Entity(#[source] anyhow::Error),
}

impl ErrorMetadata for SubmitError {
    fn error_code(&self) -> &'static str {
        match self {
            SubmitError::InFlight => "SUBMISSION_IN_FLIGHT",
            SubmitError::Upload { .. } => "UPLOAD_FAILED",
            SubmitError::Payload(_) => "INVALID_PAYLOAD",
            SubmitError::Entity(_) => "ENTITY_REQUEST_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, SubmitError::Payload(_))
    }

    fn client_message(&self) -> String {
        match self {
            SubmitError::InFlight => "Please wait for the current submission to finish".to_string(),
            SubmitError::Upload { errors } => errors.join("\n"),
            SubmitError::Payload(e) => format!("Invalid entity payload: {}", e),
            SubmitError::Entity(_) => "Failed to save, please try again".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            SubmitError::InFlight => LogLevel::Debug,
            SubmitError::Upload { .. } => LogLevel::Warn,
            SubmitError::Payload(_) | SubmitError::Entity(_) => LogLevel::Error,
        }
    }
}

/// Result of a submission that saved the entity.
#[derive(Debug, Clone)]
pub struct SubmitReport {
    /// Outcome of the upload attempt that completed the batch.
    pub outcome: BatchOutcome,
    /// Every descriptor attached by this submission, including those uploaded
    /// by earlier partially failed attempts.
    pub media: Vec<MediaDescriptor>,
    /// Response body of the entity request.
    pub response: Value,
}

/// Drives one dialog's submit: upload the staged files, merge the resulting
/// media into the entity payload, save the entity and release what was submitted.
///
/// At most one submission runs at a time. A partially failed upload keeps the
/// staging area; files that made it are remembered and not sent again on the
/// next attempt.
pub struct SubmissionController {
    bridge: SubmissionBridge,
    orchestrator: UploadOrchestrator,
    submitter: Arc<dyn EntitySubmitter>,
    in_flight: AtomicBool,
    cancel: Mutex<CancellationToken>,
}

impl SubmissionController {
    pub fn new(
        bridge: SubmissionBridge,
        orchestrator: UploadOrchestrator,
        submitter: Arc<dyn EntitySubmitter>,
    ) -> Self {
        Self {
            bridge,
            orchestrator,
            submitter,
            in_flight: AtomicBool::new(false),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Abandon the running submission. Transfers not yet finished fail with
    /// "Upload cancelled" and the entity is not saved.
    pub fn cancel(&self) {
        self.cancel.lock().cancel();
    }

    pub async fn submit(
        &self,
        request: EntityRequest,
        on_progress: Option<&ProgressFn>,
    ) -> Result<SubmitReport, SubmitError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(SubmitError::InFlight)?;

        let cancel = {
            let mut token = self.cancel.lock();
            if token.is_cancelled() {
                *token = CancellationToken::new();
            }
            token.clone()
        };

        let result = self.run(request, on_progress, &cancel).await;
        if let Err(e) = &result {
            log_submit_error(e);
        }
        result
    }

    async fn run(
        &self,
        request: EntityRequest,
        on_progress: Option<&ProgressFn>,
        cancel: &CancellationToken,
    ) -> Result<SubmitReport, SubmitError> {
        // Fail on a malformed media field before anything is uploaded.
        request.existing_media().map_err(SubmitError::Payload)?;

        let rejected = self.bridge.rejected_ids();
        let (ids, files): (Vec<_>, Vec<_>) = self.bridge.pending_entries().into_iter().unzip();

        tracing::info!(
            path = %request.path,
            pending = files.len(),
            "Submitting entity"
        );

        let results = self.orchestrator.upload_all(files, on_progress, cancel).await;

        // Attachments removed while their transfer ran are left out entirely.
        let mut kept = Vec::with_capacity(results.len());
        for (id, result) in ids.into_iter().zip(results) {
            if !self.bridge.contains(id) {
                tracing::debug!(filename = %result.source_file.name, "Attachment removed during upload");
                continue;
            }
            if let Some(descriptor) = result.descriptor() {
                if !self.bridge.mark_uploaded(id, descriptor) {
                    continue;
                }
            }
            kept.push(result);
        }

        let outcome = aggregate(&kept);
        if !outcome.success {
            return Err(SubmitError::Upload {
                errors: outcome.errors,
            });
        }

        // Staging order, whichever attempt uploaded each file.
        let (mut submitted, media): (Vec<AttachmentId>, Vec<MediaDescriptor>) =
            self.bridge.uploaded_entries().into_iter().unzip();
        let request = request
            .with_merged_media(&media)
            .map_err(SubmitError::Payload)?;

        let response = self
            .submitter
            .submit(request)
            .await
            .map_err(SubmitError::Entity)?;

        // Files staged after the snapshot stay for the next submit.
        submitted.extend(rejected);
        let released = self.bridge.release(&submitted);
        tracing::info!(media = media.len(), released, "Entity saved");

        Ok(SubmitReport {
            outcome,
            media,
            response,
        })
    }
}

impl std::fmt::Debug for SubmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionController")
            .field("bridge", &self.bridge)
            .field("orchestrator", &self.orchestrator)
            .field("in_flight", &self.is_submitting())
            .finish()
    }
}

/// Holds the in-flight flag until dropped.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

fn log_submit_error(error: &SubmitError) {
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(error = %error, code = error.error_code(), "Submission rejected"),
        LogLevel::Warn => tracing::warn!(error = %error, code = error.error_code(), "Submission failed"),
        LogLevel::Error => tracing::error!(error = ?error, code = error.error_code(), "Submission failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::StagingArea;
    use async_trait::async_trait;
    use mediastage_core::{CandidateFile, TransferError, UploadTransport};
    use serde_json::json;
    use std::collections::HashSet;

    struct FailingOnce {
        fail: Mutex<HashSet<String>>,
        calls: Mutex<Vec<String>>,
    }

    impl FailingOnce {
        fn new(names: &[&str]) -> Self {
            Self {
                fail: Mutex::new(names.iter().map(|n| n.to_string()).collect()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl UploadTransport for FailingOnce {
        async fn upload(&self, file: &CandidateFile) -> Result<String, TransferError> {
            self.calls.lock().push(file.name.clone());
            if self.fail.lock().remove(&file.name) {
                return Err(TransferError::from_status(500, None));
            }
            Ok(format!("https://cdn.example.com/{}", file.name))
        }
    }

    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<EntityRequest>>,
    }

    #[async_trait]
    impl EntitySubmitter for Recorder {
        async fn submit(&self, request: EntityRequest) -> anyhow::Result<Value> {
            self.requests.lock().push(request);
            Ok(json!({ "id": 7 }))
        }
    }

    fn png(name: &str) -> CandidateFile {
        CandidateFile::new(name, "image/png", vec![1u8; 8])
    }

    #[tokio::test]
    async fn test_retry_uploads_only_failed_files() {
        let transport = Arc::new(FailingOnce::new(&["b.png"]));
        let submitter = Arc::new(Recorder::default());
        let bridge = SubmissionBridge::new();
        let staging = Arc::new(Mutex::new(StagingArea::default()));
        staging.lock().add_files(vec![png("a.png"), png("b.png")]);
        let _registration = bridge.register(staging.clone());

        let controller = SubmissionController::new(
            bridge,
            UploadOrchestrator::new(transport.clone()),
            submitter.clone(),
        );

        let err = controller
            .submit(EntityRequest::create("/bundles"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Upload { ref errors } if errors.len() == 1));
        assert!(submitter.requests.lock().is_empty());
        assert_eq!(staging.lock().len(), 2);

        let report = controller
            .submit(EntityRequest::create("/bundles"), None)
            .await
            .unwrap();

        assert_eq!(*transport.calls.lock(), vec!["a.png", "b.png", "b.png"]);
        let names: Vec<&str> = report.media.iter().map(|m| m.filename.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
        assert_eq!(report.response, json!({ "id": 7 }));
        assert!(staging.lock().is_empty());

        let requests = submitter.requests.lock();
        assert_eq!(requests[0].body["media"].as_array().map(|m| m.len()), Some(2));
    }

    #[tokio::test]
    async fn test_malformed_media_field_uploads_nothing() {
        let transport = Arc::new(FailingOnce::new(&[]));
        let bridge = SubmissionBridge::new();
        let staging = Arc::new(Mutex::new(StagingArea::default()));
        staging.lock().add_files(vec![png("a.png")]);
        let _registration = bridge.register(staging);

        let controller = SubmissionController::new(
            bridge,
            UploadOrchestrator::new(transport.clone()),
            Arc::new(Recorder::default()),
        );

        let mut body = serde_json::Map::new();
        body.insert("media".to_string(), json!("not a list"));
        let err = controller
            .submit(EntityRequest::update("/services/3").with_body(body), None)
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Payload(_)));
        assert!(!err.is_recoverable());
        assert!(transport.calls.lock().is_empty());
        assert!(!controller.is_submitting());
    }

    #[test]
    fn test_in_flight_guard_is_exclusive() {
        let flag = AtomicBool::new(false);
        let guard = InFlightGuard::acquire(&flag);
        assert!(guard.is_some());
        assert!(InFlightGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(InFlightGuard::acquire(&flag).is_some());
    }

    #[test]
    fn test_upload_error_message_lists_each_file() {
        let err = SubmitError::Upload {
            errors: vec![
                "a.png: Network error while uploading".to_string(),
                "b.png: File is too large for the server".to_string(),
            ],
        };
        assert_eq!(
            err.client_message(),
            "a.png: Network error while uploading\nb.png: File is too large for the server"
        );
        assert_eq!(err.error_code(), "UPLOAD_FAILED");
    }
}
