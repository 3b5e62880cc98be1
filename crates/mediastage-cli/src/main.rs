//! MediaStage CLI: validate, upload and attach local files to an entity.
//!
//! Reads MEDIASTAGE_API_URL (or API_URL) and MEDIASTAGE_API_KEY (or API_KEY),
//! plus the upload limits documented on `MediaStageConfig::from_env`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use mediastage_api_client::ApiClient;
use mediastage_cli::{init_tracing, load_candidates, parse_body, progress_line, staged_report};
use mediastage_core::{EntityRequest, ErrorMetadata, MediaStageConfig};
use mediastage_processing::{
    StagingArea, SubmissionBridge, SubmissionController, UploadOrchestrator, UploadStrategy,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "mediastage", about = "Stage, upload and attach media files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check files against the upload policy without uploading
    Validate {
        /// Files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Upload files and print the resulting media descriptors
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Upload files and attach them to a new or existing entity
    Submit {
        /// Entity path, e.g. `bundles` or `services/42`
        #[arg(long)]
        path: String,
        /// Update the entity (PUT) instead of creating it (POST)
        #[arg(long)]
        update: bool,
        /// Entity JSON body; its media field is extended with the uploads
        #[arg(long)]
        body: Option<String>,
        /// Name of the media field in the body
        #[arg(long, default_value = EntityRequest::DEFAULT_MEDIA_FIELD)]
        media_field: String,
        /// Files to attach
        files: Vec<PathBuf>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn print_progress(done: usize, total: usize) {
    eprintln!("{}", progress_line(done, total));
}

/// Stage files and report rejections on stderr.
fn stage(config: &MediaStageConfig, files: &[PathBuf]) -> anyhow::Result<StagingArea> {
    let mut staging = StagingArea::new(config.policy.clone());
    let outcomes = staging.add_files(load_candidates(files)?);

    for (attachment, outcome) in staging.attachments().iter().zip(&outcomes) {
        if let Some(reason) = &outcome.rejection_reason {
            eprintln!("skipping {}: {}", attachment.file.name, reason);
        }
    }
    Ok(staging)
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling uploads");
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = MediaStageConfig::from_env().context("Failed to load configuration")?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { files } => {
            let staging = stage(&config, &files)?;
            print_json(&staged_report(&staging))?;
        }
        Commands::Upload { files } => {
            let staging = stage(&config, &files)?;
            let client = ApiClient::from_config(&config)?;
            let orchestrator = UploadOrchestrator::new(Arc::new(client))
                .with_strategy(UploadStrategy::bounded(config.max_in_flight));

            let cancel = CancellationToken::new();
            cancel_on_ctrl_c(cancel.clone());

            let outcome = orchestrator
                .upload_batch(staging.pending_files(), Some(&print_progress), &cancel)
                .await;
            print_json(&outcome)?;

            if !outcome.success {
                anyhow::bail!("{} file(s) failed to upload", outcome.errors.len());
            }
        }
        Commands::Submit {
            path,
            update,
            body,
            media_field,
            files,
        } => {
            let request = if update {
                EntityRequest::update(path)
            } else {
                EntityRequest::create(path)
            }
            .with_body(parse_body(body.as_deref())?)
            .with_media_field(media_field);

            let staging = Arc::new(Mutex::new(stage(&config, &files)?));
            let bridge = SubmissionBridge::new();
            let _registration = bridge.register(staging);

            let client = Arc::new(ApiClient::from_config(&config)?);
            let orchestrator = UploadOrchestrator::new(client.clone())
                .with_strategy(UploadStrategy::bounded(config.max_in_flight));
            let controller = Arc::new(SubmissionController::new(bridge, orchestrator, client));

            let interrupt = controller.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, cancelling submission");
                    interrupt.cancel();
                }
            });

            match controller.submit(request, Some(&print_progress)).await {
                Ok(report) => print_json(&serde_json::json!({
                    "media": report.media,
                    "response": report.response,
                }))?,
                Err(e) => {
                    eprintln!("{}", e.client_message());
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}
