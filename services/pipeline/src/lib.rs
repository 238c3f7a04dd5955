//! Orchestration of one pipeline run.
//!
//! A run is strictly sequential: resolve the latest manifests, fetch the
//! files into the raw cache, aggregate them into one dataset, normalize onto
//! the fixed easting/northing grid, then persist the artifacts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use datahub_client::{fetch, resolve, DataHubClient};
use nwp_grid::SourceFile;
use zarr_out::{persist, ArtifactStore, Format};

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Orders to process; `None` means every order on the account.
    pub order_ids: Option<Vec<String>>,
    /// Directory the raw GRIB files are cached in.
    pub cache_dir: PathBuf,
    /// Artifact formats to write.
    pub formats: Vec<Format>,
    /// Whether to also write the `latest.*` copies.
    pub save_latest: bool,
}

/// Execute one run end to end. Returns the artifact names written.
pub async fn run_pipeline(
    client: &DataHubClient,
    store: &dyn ArtifactStore,
    options: &RunOptions,
) -> Result<Vec<String>> {
    let resolved = resolve(client, options.order_ids.as_deref())
        .await
        .context("resolving latest manifests")?;
    let fetched = fetch(client, &options.cache_dir, &resolved)
        .await
        .context("fetching manifest files")?;

    let sources: Vec<SourceFile> = fetched
        .iter()
        .map(|f| SourceFile {
            variable: f.resolved.file_id.variable().to_string(),
            path: f.path.clone(),
        })
        .collect();

    let dataset = nwp_grid::aggregate(&sources, Utc::now()).context("aggregating grids")?;
    let dataset = regrid::normalize(dataset).context("normalizing onto the target grid")?;
    let written = persist(&dataset, store, &options.formats, options.save_latest)
        .await
        .context("persisting artifacts")?;

    info!(artifacts = written.len(), "pipeline run complete");
    Ok(written)
}

/// Fire-and-forget refresh notification after a successful run. Failures are
/// logged, never propagated.
pub async fn notify(url: &str) {
    let client = reqwest::Client::new();
    let result = client
        .post(url)
        .json(&serde_json::json!({ "status": "updated" }))
        .send()
        .await;
    match result {
        Ok(response) if response.status().is_success() => {
            info!(url, "refresh notification sent");
        }
        Ok(response) => {
            warn!(url, status = %response.status(), "refresh notification rejected");
        }
        Err(e) => {
            warn!(url, error = %e, "refresh notification failed");
        }
    }
}

/// Log the completed runs for every model on the account.
pub async fn print_runs(client: &DataHubClient) -> Result<()> {
    let runs = client.get_runs().await.context("listing completed runs")?;
    for model in runs.runs {
        for run in model.complete_runs {
            info!(
                model = %model.model_id,
                run = run.run,
                run_date_time = %run.run_date_time,
                "complete run"
            );
        }
    }
    Ok(())
}
