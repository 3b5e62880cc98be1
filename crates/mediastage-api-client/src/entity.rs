//! Parent entity create/update request.

use anyhow::{Context, Result};
use async_trait::async_trait;
use mediastage_core::{EntityRequest, EntitySubmitter, SubmitMode};
use serde_json::Value;

use crate::ApiClient;

#[async_trait]
impl EntitySubmitter for ApiClient {
    async fn submit(&self, request: EntityRequest) -> Result<Value> {
        tracing::debug!(
            mode = ?request.mode,
            path = %request.path,
            "Sending entity request"
        );

        let body = Value::Object(request.body);
        let response = match request.mode {
            SubmitMode::Create => self.post_json(&request.path, &body).await,
            SubmitMode::Update => self.put_json(&request.path, &body).await,
        };
        response.with_context(|| format!("Failed to save entity at {}", request.path))
    }
}
