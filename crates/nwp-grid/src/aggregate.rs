//! Aggregation of many downloaded files into one dataset.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use ndarray::Axis;
use tracing::{debug, info};

use crate::dataset::{Dataset, DatasetBuilder};
use crate::error::GridResult;
use crate::loader;

/// Forecast runs initialised more than this long ago are no longer current
/// and are dropped from the merge.
pub const STALENESS_HOURS: i64 = 7;

/// Variables translated to their canonical short names before merging,
/// applied only when the left-hand key is actually present.
const RENAME_MAP: &[(&str, &str)] = &[
    ("t2m", "t"),
    ("r2", "r"),
    ("d2m", "dpt"),
    ("u10", "u"),
    ("v10", "v"),
];

/// Parser artifacts that are never meaningful payload.
const VARS_TO_DELETE: &[&str] = &[
    "unknown",
    "valid_time",
    "heightAboveGround",
    "heightAboveGroundLayer",
    "atmosphere",
    "cloudBase",
    "surface",
    "meanSea",
    "level",
];

/// One downloaded file handed to the aggregator: the logical variable name
/// from its file id, and where the fetcher put it.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub variable: String,
    pub path: PathBuf,
}

/// Merge every file into one dataset.
///
/// Files are grouped by logical variable and folded in one at a time, each
/// loaded grid dropped as soon as its slices are in the builder. Grids whose
/// run is older than `now - 7h` are skipped entirely; if everything is stale
/// the result is an empty dataset, not an error.
pub fn aggregate(files: &[SourceFile], now: DateTime<Utc>) -> GridResult<Dataset> {
    let cutoff = now - Duration::hours(STALENESS_HOURS);

    // Group by logical variable, preserving first-seen order.
    let mut groups: Vec<(&str, Vec<&SourceFile>)> = Vec::new();
    for file in files {
        match groups.iter_mut().find(|(v, _)| *v == file.variable) {
            Some((_, members)) => members.push(file),
            None => groups.push((&file.variable, vec![file])),
        }
    }

    let mut builder = DatasetBuilder::new();
    let mut skipped = 0usize;

    for (variable, members) in groups {
        debug!(variable, files = members.len(), "aggregating variable group");

        for file in members {
            let grid = loader::load(&file.path)?;

            if grid.reference_time < cutoff {
                debug!(
                    path = %file.path.display(),
                    reference_time = %grid.reference_time,
                    %cutoff,
                    "run is stale, skipping"
                );
                skipped += 1;
                continue;
            }

            builder.set_grid(&grid.latitudes, &grid.longitudes)?;

            for var in grid.variables {
                let name = canonical_name(&var.name);
                if VARS_TO_DELETE.contains(&name) {
                    debug!(variable = name, "dropping parser artifact");
                    continue;
                }
                for (si, &step) in grid.steps.iter().enumerate() {
                    let slice = var.values.index_axis(Axis(0), si).to_owned();
                    builder.insert(name, grid.reference_time, step, slice)?;
                }
            }
            // grid dropped here, before the next file is loaded
        }
    }

    let dataset = builder.build();
    info!(
        variables = dataset.variables.len(),
        times = dataset.times.len(),
        steps = dataset.steps.len(),
        skipped_stale = skipped,
        "aggregated files"
    );
    Ok(dataset)
}

fn canonical_name(name: &str) -> &str {
    RENAME_MAP
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
        .unwrap_or(name)
}
