//! Configuration module
//!
//! Upload policy (type lists and size ceilings), orchestration strategy and
//! API client settings, loaded from the environment.

use std::env;

use crate::format::mb_to_bytes;

// Common constants
const API_URL: &str = "http://localhost:3000";
const UPLOAD_PATH: &str = "/file-upload";
const MAX_FILE_SIZE_MB: u64 = 50;
const MAX_BATCH_SIZE_MB: u64 = 100;
const UPLOAD_MAX_IN_FLIGHT: usize = 1;
const HTTP_TIMEOUT_SECS: u64 = 60;

/// Type and size policy applied to every candidate file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_file_size_bytes: u64,
    pub max_batch_size_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub denied_content_types: Vec<String>,
    pub denied_extensions: Vec<String>,
}

impl UploadPolicy {
    pub const DEFAULT_ALLOWED_CONTENT_TYPES: &'static [&'static str] = &[
        // Images
        "image/png",
        "image/jpg",
        "image/jpeg",
        "image/gif",
        "image/webp",
        "image/svg+xml",
        // Videos
        "video/mp4",
        "video/avi",
        "video/x-msvideo",
        "video/quicktime",
        "video/x-ms-wmv",
        "video/x-flv",
        "video/webm",
        // Audio
        "audio/mpeg",
        "audio/mp3",
        "audio/wav",
        "audio/ogg",
        "audio/aac",
        "audio/flac",
        // Documents
        "application/pdf",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "application/vnd.ms-excel",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "application/vnd.ms-powerpoint",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "text/plain",
        "text/csv",
        "application/rtf",
        "application/xml",
        "text/xml",
    ];

    pub const DEFAULT_DENIED_CONTENT_TYPES: &'static [&'static str] = &[
        "application/x-msdownload",
        "application/x-executable",
        "application/x-msdos-program",
        "application/vnd.microsoft.portable-executable",
        "application/x-sh",
        "application/zip",
        "application/x-zip-compressed",
        "application/x-rar-compressed",
        "application/vnd.rar",
        "application/x-7z-compressed",
        "application/x-tar",
        "application/gzip",
        "application/x-gzip",
    ];

    pub const DEFAULT_DENIED_EXTENSIONS: &'static [&'static str] = &[
        "exe", "msi", "bat", "cmd", "com", "scr", "sh", "dll", "zip", "rar", "7z", "tar", "gz",
        "tgz",
    ];

    /// Default lists with the given ceilings.
    pub fn with_limits(max_file_size_bytes: u64, max_batch_size_bytes: u64) -> Self {
        Self {
            max_file_size_bytes,
            max_batch_size_bytes,
            allowed_content_types: to_owned_list(Self::DEFAULT_ALLOWED_CONTENT_TYPES),
            denied_content_types: to_owned_list(Self::DEFAULT_DENIED_CONTENT_TYPES),
            denied_extensions: to_owned_list(Self::DEFAULT_DENIED_EXTENSIONS),
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0 || self.max_batch_size_bytes == 0 {
            return Err(anyhow::anyhow!("Upload size ceilings must be greater than zero"));
        }

        if self.max_file_size_bytes > self.max_batch_size_bytes {
            return Err(anyhow::anyhow!(
                "MAX_FILE_SIZE_MB cannot exceed MAX_BATCH_SIZE_MB"
            ));
        }

        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_CONTENT_TYPES cannot be empty"));
        }

        Ok(())
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::with_limits(mb_to_bytes(MAX_FILE_SIZE_MB), mb_to_bytes(MAX_BATCH_SIZE_MB))
    }
}

/// How requests are authenticated against the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer {token}`
    Bearer,
    /// `X-API-Key: {key}`
    ApiKey,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct MediaStageConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub auth_scheme: AuthScheme,
    pub upload_path: String,
    pub http_timeout_secs: u64,
    pub max_in_flight: usize,
    pub policy: UploadPolicy,
}

impl Default for MediaStageConfig {
    fn default() -> Self {
        Self {
            api_url: API_URL.to_string(),
            api_key: None,
            auth_scheme: AuthScheme::ApiKey,
            upload_path: UPLOAD_PATH.to_string(),
            http_timeout_secs: HTTP_TIMEOUT_SECS,
            max_in_flight: UPLOAD_MAX_IN_FLIGHT,
            policy: UploadPolicy::default(),
        }
    }
}

impl MediaStageConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. `from_env` uses the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("MEDIASTAGE_API_URL")
            .or_else(|| lookup("API_URL"))
            .unwrap_or_else(|| API_URL.to_string());

        let api_key = lookup("MEDIASTAGE_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .filter(|k| !k.trim().is_empty());

        let auth_scheme = match lookup("MEDIASTAGE_AUTH_SCHEME")
            .unwrap_or_else(|| "api-key".to_string())
            .to_lowercase()
            .as_str()
        {
            "bearer" => AuthScheme::Bearer,
            "api-key" | "api_key" | "x-api-key" => AuthScheme::ApiKey,
            other => {
                return Err(anyhow::anyhow!(
                    "MEDIASTAGE_AUTH_SCHEME must be 'bearer' or 'api-key', got '{}'",
                    other
                ))
            }
        };

        let max_file_size_mb: u64 = parse_or(&lookup, "MAX_FILE_SIZE_MB", MAX_FILE_SIZE_MB)?;
        let max_batch_size_mb: u64 = parse_or(&lookup, "MAX_BATCH_SIZE_MB", MAX_BATCH_SIZE_MB)?;

        let mut policy =
            UploadPolicy::with_limits(mb_to_bytes(max_file_size_mb), mb_to_bytes(max_batch_size_mb));
        if let Some(list) = lookup("ALLOWED_CONTENT_TYPES") {
            policy.allowed_content_types = split_list(&list);
        }
        if let Some(list) = lookup("DENIED_CONTENT_TYPES") {
            policy.denied_content_types = split_list(&list);
        }

        let config = Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            auth_scheme,
            upload_path: lookup("UPLOAD_PATH").unwrap_or_else(|| UPLOAD_PATH.to_string()),
            http_timeout_secs: parse_or(&lookup, "HTTP_TIMEOUT_SECS", HTTP_TIMEOUT_SECS)?,
            max_in_flight: parse_or(&lookup, "UPLOAD_MAX_IN_FLIGHT", UPLOAD_MAX_IN_FLIGHT)?,
            policy,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "MEDIASTAGE_API_URL must start with http:// or https://"
            ));
        }

        if !self.upload_path.starts_with('/') {
            return Err(anyhow::anyhow!("UPLOAD_PATH must start with '/'"));
        }

        if self.max_in_flight == 0 {
            return Err(anyhow::anyhow!("UPLOAD_MAX_IN_FLIGHT must be at least 1"));
        }

        if self.http_timeout_secs == 0 {
            return Err(anyhow::anyhow!("HTTP_TIMEOUT_SECS must be greater than zero"));
        }

        self.policy.validate()
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", key)),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
