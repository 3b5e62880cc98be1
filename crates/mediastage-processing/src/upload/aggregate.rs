use mediastage_core::{BatchOutcome, TransferError, UploadResult};

/// Reduce per-file results to a batch outcome.
///
/// Media and errors keep the input order; errors read `"<filename>: <error>"`.
pub fn aggregate(results: &[UploadResult]) -> BatchOutcome {
    let mut media = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result.descriptor() {
            Some(descriptor) => media.push(descriptor),
            None => {
                let reason = match &result.error {
                    Some(error) => error.clone(),
                    None => TransferError::InvalidResponse.to_string(),
                };
                errors.push(format!("{}: {}", result.source_file.name, reason));
            }
        }
    }

    BatchOutcome {
        success: errors.is_empty(),
        media,
        errors,
    }
}
