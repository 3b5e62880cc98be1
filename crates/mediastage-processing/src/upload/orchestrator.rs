use futures::stream::{self, StreamExt};
use mediastage_core::{
    BatchOutcome, CandidateFile, ErrorMetadata, LogLevel, TransferError, UploadResult,
    UploadTransport,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::aggregate::aggregate;

/// Progress callback: `(done, total)`.
pub type ProgressFn = dyn Fn(usize, usize) + Send + Sync;

/// How many transfers may run at once.
///
/// Results and progress stay in input order whatever the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadStrategy {
    pub max_in_flight: usize,
}

impl UploadStrategy {
    pub fn sequential() -> Self {
        Self { max_in_flight: 1 }
    }

    pub fn bounded(max_in_flight: usize) -> Self {
        Self {
            max_in_flight: max_in_flight.max(1),
        }
    }
}

impl Default for UploadStrategy {
    fn default() -> Self {
        Self::sequential()
    }
}

/// Uploads a batch of files through an [`UploadTransport`].
///
/// A failed file never aborts the batch. Progress is reported once per
/// completed file, success or failure, with `done` counting up to `total`.
#[derive(Clone)]
pub struct UploadOrchestrator {
    transport: Arc<dyn UploadTransport>,
    strategy: UploadStrategy,
}

impl UploadOrchestrator {
    pub fn new(transport: Arc<dyn UploadTransport>) -> Self {
        Self {
            transport,
            strategy: UploadStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: UploadStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Upload every file and aggregate the results.
    pub async fn upload_batch(
        &self,
        files: Vec<CandidateFile>,
        on_progress: Option<&ProgressFn>,
        cancel: &CancellationToken,
    ) -> BatchOutcome {
        let results = self.upload_all(files, on_progress, cancel).await;
        aggregate(&results)
    }

    /// Upload every file, returning one result per file in input order.
    ///
    /// Files not finished when `cancel` fires fail with "Upload cancelled"
    /// and are not reported as progress.
    pub async fn upload_all(
        &self,
        files: Vec<CandidateFile>,
        on_progress: Option<&ProgressFn>,
        cancel: &CancellationToken,
    ) -> Vec<UploadResult> {
        let total = files.len();
        if total == 0 {
            return Vec::new();
        }

        tracing::info!(
            files = total,
            max_in_flight = self.strategy.max_in_flight,
            "Starting upload batch"
        );

        let mut transfers = stream::iter(files)
            .map(|file| self.upload_one(file, cancel))
            .buffered(self.strategy.max_in_flight.max(1));

        let mut results = Vec::with_capacity(total);
        let mut done = 0;
        while let Some((result, completed)) = transfers.next().await {
            if completed {
                done += 1;
                if let Some(progress) = on_progress {
                    progress(done, total);
                }
            }
            results.push(result);
        }

        let failed = results.iter().filter(|r| !r.success).count();
        tracing::info!(
            files = total,
            succeeded = total - failed,
            failed,
            cancelled = cancel.is_cancelled(),
            "Upload batch finished"
        );

        results
    }

    /// Transfer one file. The flag is `false` when the file was cancelled
    /// before its transfer completed.
    async fn upload_one(
        &self,
        file: CandidateFile,
        cancel: &CancellationToken,
    ) -> (UploadResult, bool) {
        if cancel.is_cancelled() {
            return (cancelled(file), false);
        }

        tracing::debug!(filename = %file.name, size = file.size, "Uploading file");

        let transfer = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransferError::Cancelled),
            result = self.transport.upload(&file) => result,
        };

        match transfer {
            Ok(url) => {
                tracing::debug!(filename = %file.name, url = %url, "File uploaded");
                (UploadResult::succeeded(file, url), true)
            }
            Err(TransferError::Cancelled) => (cancelled(file), false),
            Err(e) => {
                log_transfer_error(&file, &e);
                (UploadResult::failed(file, e.client_message()), true)
            }
        }
    }
}

impl std::fmt::Debug for UploadOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOrchestrator")
            .field("strategy", &self.strategy)
            .finish()
    }
}

fn cancelled(file: CandidateFile) -> UploadResult {
    tracing::debug!(filename = %file.name, "Upload cancelled");
    UploadResult::failed(file, TransferError::Cancelled.client_message())
}

fn log_transfer_error(file: &CandidateFile, error: &TransferError) {
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(filename = %file.name, error = %error, code = error.error_code(), "Upload failed")
        }
        LogLevel::Warn => {
            tracing::warn!(filename = %file.name, error = %error, code = error.error_code(), "Upload failed")
        }
        LogLevel::Error => {
            tracing::error!(filename = %file.name, error = %error, code = error.error_code(), "Upload failed")
        }
    }
}
