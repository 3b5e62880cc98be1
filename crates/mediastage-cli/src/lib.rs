use anyhow::{Context, Result};
use mediastage_core::format::format_file_size;
use mediastage_core::{CandidateFile, MediaKind};
use mediastage_processing::StagingArea;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Read every path into a candidate file, in argument order.
pub fn load_candidates(paths: &[PathBuf]) -> Result<Vec<CandidateFile>> {
    paths.iter().map(CandidateFile::from_path).collect()
}

/// Parse the `--body` argument. Absent means an empty object.
pub fn parse_body(raw: Option<&str>) -> Result<Map<String, Value>> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };

    match serde_json::from_str(raw).context("Failed to parse --body as JSON")? {
        Value::Object(body) => Ok(body),
        other => Err(anyhow::anyhow!(
            "--body must be a JSON object, got {}",
            other
        )),
    }
}

/// One row of the staging list as printed by `validate`.
#[derive(Debug, Serialize)]
pub struct StagedFileReport {
    pub file: String,
    pub size: String,
    pub kind: MediaKind,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub fn staged_report(staging: &StagingArea) -> Vec<StagedFileReport> {
    staging
        .attachments()
        .iter()
        .map(|a| StagedFileReport {
            file: a.file.name.clone(),
            size: format_file_size(a.file.size),
            kind: a.kind,
            accepted: !a.is_rejected(),
            reason: a.rejection_reason.clone(),
        })
        .collect()
}

pub fn progress_line(done: usize, total: usize) -> String {
    format!("[{}/{}] uploaded", done, total)
}
