//! HTTP client for the MediaStage API.
//!
//! Provides a minimal client with configurable auth (Bearer token or X-API-Key)
//! and JSON/multipart helpers. [`ApiClient`] implements both pipeline
//! collaborators: [`UploadTransport`](mediastage_core::UploadTransport) for
//! the upload endpoint and [`EntitySubmitter`](mediastage_core::EntitySubmitter)
//! for the parent entity request.

mod entity;
mod upload;

use anyhow::{Context, Result};
use mediastage_core::{AuthScheme, MediaStageConfig};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// `X-API-Key: {key}`
    XApiKey(String),
    /// No credentials (local development servers).
    Anonymous,
}

impl Auth {
    fn from_config(config: &MediaStageConfig) -> Self {
        match (&config.api_key, config.auth_scheme) {
            (None, _) => Auth::Anonymous,
            (Some(key), AuthScheme::Bearer) => Auth::Bearer(key.clone()),
            (Some(key), AuthScheme::ApiKey) => Auth::XApiKey(key.clone()),
        }
    }
}

/// HTTP client for the MediaStage API with configurable auth.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
    upload_path: String,
}

impl ApiClient {
    pub const DEFAULT_UPLOAD_PATH: &'static str = "/file-upload";

    pub fn new(base_url: impl Into<String>, auth: Auth, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            upload_path: Self::DEFAULT_UPLOAD_PATH.to_string(),
        })
    }

    /// Build a client from loaded configuration.
    pub fn from_config(config: &MediaStageConfig) -> Result<Self> {
        let client = Self::new(
            config.api_url.clone(),
            Auth::from_config(config),
            Duration::from_secs(config.http_timeout_secs),
        )?;
        Ok(client.with_upload_path(config.upload_path.clone()))
    }

    pub fn with_upload_path(mut self, path: impl Into<String>) -> Self {
        self.upload_path = normalize_path(&path.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn upload_path(&self) -> &str {
        &self.upload_path
    }

    /// Absolute URL for an API path. A missing leading slash is added.
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, normalize_path(path))
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
            Auth::XApiKey(key) => request.header("X-API-Key", key.as_str()),
            Auth::Anonymous => request,
        }
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.build_url(path);
        self.apply_auth(self.client.request(method, url))
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(Method::POST, path, body).await
    }

    /// PUT JSON body and deserialize response.
    pub async fn put_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(Method::PUT, path, body).await
    }

    async fn send_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .request(method, path)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;
        parse_json(response).await
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(anyhow::anyhow!(
            "API request failed with status {}: {}",
            status,
            error_text
        ));
    }

    let bytes = response
        .bytes()
        .await
        .context("Failed to read response body")?;
    // Some endpoints answer 204 or an empty 200.
    let bytes = if bytes.iter().all(u8::is_ascii_whitespace) {
        &b"null"[..]
    } else {
        &bytes[..]
    };
    serde_json::from_slice(bytes).context("Failed to parse response as JSON")
}
