//! Scripted in-memory upload transport.

use async_trait::async_trait;
use mediastage_core::{CandidateFile, TransferError, UploadTransport};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub const CDN: &str = "https://cdn.example.com";

/// Pauses one transfer until the test releases it.
#[derive(Default)]
pub struct Gate {
    pub started: Notify,
    pub release: Notify,
}

/// Upload transport answering from a script.
///
/// Files without a scripted failure succeed with `{CDN}/{name}`. Scripted
/// failures and gates apply to the next transfer of that file only.
#[derive(Default)]
pub struct ScriptedTransport {
    failures: Mutex<HashMap<String, TransferError>>,
    gates: Mutex<HashMap<String, Arc<Gate>>>,
    calls: Mutex<Vec<String>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_once(&self, name: &str, error: TransferError) {
        self.failures.lock().insert(name.to_string(), error);
    }

    pub fn gate(&self, name: &str) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates.lock().insert(name.to_string(), gate.clone());
        gate
    }

    /// File names in the order their transfers started.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Highest number of transfers observed running at once.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UploadTransport for ScriptedTransport {
    async fn upload(&self, file: &CandidateFile) -> Result<String, TransferError> {
        self.calls.lock().push(file.name.clone());
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        let _active = ActiveGuard(&self.active);

        let gate = self.gates.lock().remove(&file.name);
        if let Some(gate) = gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }

        let failure = self.failures.lock().remove(&file.name);
        match failure {
            Some(error) => Err(error),
            None => Ok(format!("{}/{}", CDN, file.name)),
        }
    }
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
