//! Batch orchestration: fan-out/fan-in image generation with per-item
//! error isolation.
//!
//! All generation calls of a batch start together and are joined with
//! `join_all`, which waits for every completion and preserves input order.
//! A failing item never aborts its siblings; partial success is a normal
//! outcome. The one batch-wide failure is the initial output-directory
//! creation, which short-circuits before any provider call.

use crate::error::Error;
use crate::provider::ImageProvider;
use crate::storage;
use futures::future::join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One requested image: what to draw and what to call the file.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ImageRequest {
    /// Text description of the image to generate
    pub description: String,
    /// Desired filename for the image, without extension
    pub filename: String,
}

/// One tool invocation requesting several independent images sharing an
/// output directory.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    /// Folder path where the images should be saved
    pub output_folder: String,
    /// Images to generate; result order matches this order
    pub images: Vec<ImageRequest>,
}

/// Outcome of one image request. Success and failure are exclusive:
/// `file_path` is present iff success, `error` iff failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    /// Whether generation and persistence both succeeded
    pub success: bool,
    /// Path of the written file (success only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Failure reason (failure only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The originating request's description
    pub description: String,
    /// The originating request's filename
    pub filename: String,
}

impl ImageResult {
    fn success(request: &ImageRequest, file_path: String) -> Self {
        Self {
            success: true,
            file_path: Some(file_path),
            error: None,
            description: request.description.clone(),
            filename: request.filename.clone(),
        }
    }

    fn failure(request: &ImageRequest, error: String) -> Self {
        Self {
            success: false,
            file_path: None,
            error: Some(error),
            description: request.description.clone(),
            filename: request.filename.clone(),
        }
    }
}

/// Aggregate outcome of a batch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// AND of all per-item successes
    pub overall_success: bool,
    /// Batch-wide setup failure reason, set only when the output directory
    /// could not be created and no generation was attempted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Per-item outcomes in input order
    pub results: Vec<ImageResult>,
}

/// Run a batch: ensure the output directory once, fan out one provider call
/// per image, persist successes, and join all outcomes.
///
/// Concurrency is unordered and unbounded; completion order is unspecified
/// but result order is fixed to the input order. Already-written files are
/// kept when sibling items fail.
pub async fn run_batch(provider: &dyn ImageProvider, batch: &BatchRequest) -> BatchResult {
    info!(
        provider = provider.name(),
        count = batch.images.len(),
        folder = %batch.output_folder,
        "Starting image batch"
    );

    // The output directory is created exactly once, before any generation
    // call. Failure here voids the whole batch.
    if let Err(e) = storage::ensure_dir(&batch.output_folder).await {
        let message = format!(
            "Failed to create output directory {}: {}",
            batch.output_folder, e
        );
        warn!(folder = %batch.output_folder, error = %e, "Batch setup failed");
        let results = batch
            .images
            .iter()
            .map(|request| ImageResult::failure(request, message.clone()))
            .collect();
        return BatchResult {
            overall_success: false,
            error: Some(message),
            results,
        };
    }

    let results = join_all(
        batch
            .images
            .iter()
            .map(|request| generate_one(provider, &batch.output_folder, request)),
    )
    .await;

    let overall_success = results.iter().all(|r| r.success);
    let failed = results.iter().filter(|r| !r.success).count();
    if failed > 0 {
        warn!(failed, total = results.len(), "Batch finished with failures");
    } else {
        info!(count = results.len(), "Batch finished");
    }

    BatchResult {
        overall_success,
        error: None,
        results,
    }
}

/// Generate and persist a single item of a batch.
///
/// Never returns an error: every failure mode is folded into the item's
/// `ImageResult` so siblings are unaffected.
async fn generate_one(
    provider: &dyn ImageProvider,
    output_folder: &str,
    request: &ImageRequest,
) -> ImageResult {
    let bytes = match provider.generate(&request.description).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(filename = %request.filename, error = %e, "Generation failed");
            return ImageResult::failure(request, e.to_string());
        }
    };

    let path = storage::image_path(output_folder, &request.filename);
    match storage::save(&bytes, &path).await {
        Ok(()) => ImageResult::success(request, path.display().to_string()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Write failed");
            ImageResult::failure(request, e.to_string())
        }
    }
}

/// Generate a single image outside of a batch (the `generate_image` tool).
///
/// Mirrors the single-image variant: generate first, then ensure the
/// directory, then write. Returns the written file path.
pub async fn generate_single(
    provider: &dyn ImageProvider,
    description: &str,
    output_folder: &str,
    filename: &str,
) -> Result<String, Error> {
    let bytes = provider.generate(description).await?;
    storage::ensure_dir(output_folder).await?;
    let path = storage::image_path(output_folder, filename);
    storage::save(&bytes, &path).await?;
    info!(path = %path.display(), "Generated image");
    Ok(path.display().to_string())
}
