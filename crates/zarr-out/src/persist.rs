//! Writing the latest and historic artifact copies.

use tracing::{info, warn};

use nwp_grid::Dataset;

use crate::error::StoreResult;
use crate::netcdf;
use crate::stack::stack;
use crate::store::ArtifactStore;
use crate::zarr;

/// Supported artifact formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Zarr,
    NetCdf,
}

impl Format {
    fn extension(&self) -> &'static str {
        match self {
            Format::Zarr => "zarr",
            Format::NetCdf => "nc",
        }
    }
}

/// Persist a normalised dataset.
///
/// Each format is written under a name derived from the first initialisation
/// time (the append-only history) and, when `save_latest` is set, again as
/// `latest.<ext>` (overwritten every run). Returns the artifact names
/// written. A dataset with no variables writes nothing; that is the designed
/// outcome of everything being filtered, not an error.
pub async fn persist(
    dataset: &Dataset,
    store: &dyn ArtifactStore,
    formats: &[Format],
    save_latest: bool,
) -> StoreResult<Vec<String>> {
    if dataset.variables.is_empty() {
        warn!("dataset is empty, nothing to persist");
        return Ok(Vec::new());
    }

    let stacked = stack(dataset)?;
    let stem = stacked.init_times[0].to_rfc3339();

    let mut written = Vec::new();
    for format in formats {
        let mut names = vec![format!("{}.{}", stem, format.extension())];
        if save_latest {
            names.push(format!("latest.{}", format.extension()));
        }

        match format {
            Format::Zarr => {
                let storage = store.zarr_storage()?;
                for name in &names {
                    zarr::write_zarr(storage.clone(), &zarr::node_path(name), &stacked)?;
                }
            }
            Format::NetCdf => {
                // Encode once to a local scratch file, publish per name.
                let bytes = netcdf::encode(&stacked)?;
                let scratch_dir = tempfile::tempdir()?;
                let scratch = scratch_dir.path().join("dataset.nc");
                tokio::fs::write(&scratch, &bytes).await?;
                for name in &names {
                    store.put_file(name, &scratch).await?;
                }
            }
        }

        for name in names {
            info!(artifact = %name, "persisted artifact");
            written.push(name);
        }
    }

    Ok(written)
}
