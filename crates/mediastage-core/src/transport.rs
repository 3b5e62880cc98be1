//! Collaborator traits for the attachment pipeline
//!
//! The pipeline never talks HTTP directly. It transfers files through an
//! [`UploadTransport`] and hands the finished entity payload to an
//! [`EntitySubmitter`]; `mediastage-api-client` implements both against the
//! REST API and tests plug in scripted implementations.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::TransferError;
use crate::models::{CandidateFile, MediaDescriptor};

/// Transfers one file and returns the remote URL it is stored under.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn upload(&self, file: &CandidateFile) -> Result<String, TransferError>;
}

/// Whether the entity request creates a new entity or updates an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    Create,
    Update,
}

/// Create/update request for the parent entity (bundle, service, event...).
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRequest {
    /// API path relative to the base URL, e.g. `/bundles` or `/services/42`.
    pub path: String,
    pub mode: SubmitMode,
    pub body: Map<String, Value>,
    /// Name of the media-bearing field in `body`.
    pub media_field: String,
}

impl EntityRequest {
    pub const DEFAULT_MEDIA_FIELD: &'static str = "media";

    pub fn create(path: impl Into<String>) -> Self {
        Self::new(path, SubmitMode::Create)
    }

    pub fn update(path: impl Into<String>) -> Self {
        Self::new(path, SubmitMode::Update)
    }

    fn new(path: impl Into<String>, mode: SubmitMode) -> Self {
        Self {
            path: path.into(),
            mode,
            body: Map::new(),
            media_field: Self::DEFAULT_MEDIA_FIELD.to_string(),
        }
    }

    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = body;
        self
    }

    pub fn with_media_field(mut self, field: impl Into<String>) -> Self {
        self.media_field = field.into();
        self
    }

    /// Media already persisted on the entity, as raw JSON entries.
    pub fn existing_media(&self) -> Result<Vec<Value>> {
        match self.body.get(&self.media_field) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(other) => Err(anyhow::anyhow!(
                "Field '{}' must be an array of media, got {}",
                self.media_field,
                other
            )),
        }
    }

    /// Replace the media field with `existing ++ media`, existing entries first.
    pub fn with_merged_media(mut self, media: &[MediaDescriptor]) -> Result<Self> {
        let mut merged = self.existing_media()?;
        for descriptor in media {
            merged.push(serde_json::to_value(descriptor)?);
        }
        self.body
            .insert(self.media_field.clone(), Value::Array(merged));
        Ok(self)
    }
}

/// Issues the parent entity create/update request.
#[async_trait]
pub trait EntitySubmitter: Send + Sync {
    async fn submit(&self, request: EntityRequest) -> Result<Value>;
}
