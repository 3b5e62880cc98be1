//! Upload endpoint: one multipart `file` part per request, `{ "url": ... }` back.

use async_trait::async_trait;
use mediastage_core::{CandidateFile, TransferError, UploadTransport};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Deserialize;

use crate::ApiClient;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: Option<String>,
}

/// Error body returned by the API (`{ "message": ... }` or `{ "error": ... }`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message.or(self.error)
    }
}

impl ApiClient {
    /// Upload one file and return the URL it is stored under.
    pub async fn upload_file(&self, file: &CandidateFile) -> Result<String, TransferError> {
        let form = Form::new().part("file", file_part(file));

        let response = self
            .request(Method::POST, self.upload_path())
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransferError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransferError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_message);
            return Err(TransferError::from_status(status.as_u16(), message));
        }

        let parsed: UploadResponse =
            serde_json::from_slice(&body).map_err(|_| TransferError::InvalidResponse)?;
        match parsed.url {
            Some(url) if !url.trim().is_empty() => Ok(url),
            _ => Err(TransferError::InvalidResponse),
        }
    }
}

#[async_trait]
impl UploadTransport for ApiClient {
    async fn upload(&self, file: &CandidateFile) -> Result<String, TransferError> {
        self.upload_file(file).await
    }
}

fn file_part(file: &CandidateFile) -> Part {
    let bytes = || Part::bytes(file.data.to_vec()).file_name(file.name.clone());

    let mime_type = file.effective_mime_type();
    if mime_type.is_empty() {
        return bytes();
    }
    match bytes().mime_str(&mime_type) {
        Ok(part) => part,
        Err(e) => {
            tracing::debug!(filename = %file.name, mime_type = %mime_type, error = %e, "Unparseable content type, sending without it");
            bytes()
        }
    }
}
