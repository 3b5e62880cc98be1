//! Recording entity submitter.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use mediastage_core::{EntityRequest, EntitySubmitter};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Records every entity request; optionally fails the first `n` of them.
#[derive(Default)]
pub struct RecordingSubmitter {
    requests: Mutex<Vec<EntityRequest>>,
    failures_left: AtomicUsize,
}

impl RecordingSubmitter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(times: usize) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            failures_left: AtomicUsize::new(times),
        })
    }

    pub fn requests(&self) -> Vec<EntityRequest> {
        self.requests.lock().clone()
    }

    /// URLs in the media field of the last request.
    pub fn last_media_urls(&self) -> Vec<String> {
        let requests = self.requests.lock();
        let Some(last) = requests.last() else {
            return Vec::new();
        };
        last.body
            .get(&last.media_field)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|m| m.get("url").and_then(Value::as_str).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl EntitySubmitter for RecordingSubmitter {
    async fn submit(&self, request: EntityRequest) -> Result<Value> {
        let id = {
            let mut requests = self.requests.lock();
            requests.push(request);
            requests.len()
        };

        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(anyhow!("HTTP 503: service unavailable"));
        }

        Ok(json!({ "id": id }))
    }
}
