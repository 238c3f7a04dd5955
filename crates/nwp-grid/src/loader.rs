//! Grid file loading.
//!
//! One downloaded file can hold several messages: distinct parameters, or the
//! same parameter at several lead times. [`load`] decodes them all and merges
//! them into one [`LoadedGrid`] aligned on common dimensions.

use std::collections::HashMap;
use std::path::Path;

use ndarray::{Array2, Array3, Axis};
use tracing::debug;

use grib_decode::decode_all;

use crate::dataset::{GridVariable, LoadedGrid};
use crate::error::{GridError, GridResult};

/// Load one grid file from disk.
pub fn load(path: &Path) -> GridResult<LoadedGrid> {
    let bytes = std::fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "loading grid file");
    load_bytes(&bytes)
}

/// Decode a grid payload and merge its messages.
///
/// Every message must share the reference time and spatial coordinates;
/// anything else cannot be merged and is an error.
pub fn load_bytes(data: &[u8]) -> GridResult<LoadedGrid> {
    let messages = decode_all(data)?;

    let reference_time = messages[0].identification.reference_time;
    let latitudes = messages[0].grid.latitudes();
    let longitudes = messages[0].grid.longitudes();

    let mut steps: Vec<u32> = Vec::new();
    // (name, level coordinate) -> step -> field, in first-seen order.
    let mut order: Vec<(String, String)> = Vec::new();
    let mut fields: HashMap<(String, String), HashMap<u32, Array2<f32>>> = HashMap::new();

    for message in &messages {
        if message.identification.reference_time != reference_time {
            return Err(GridError::IncompatibleGrids(format!(
                "reference times {} and {} in one file",
                reference_time, message.identification.reference_time
            )));
        }
        if message.grid.latitudes() != latitudes || message.grid.longitudes() != longitudes {
            return Err(GridError::IncompatibleGrids(
                "messages are on different spatial grids".to_string(),
            ));
        }

        let values = message.values()?;
        let field = Array2::from_shape_vec((message.grid.nj, message.grid.ni), values)
            .map_err(|e| GridError::IncompatibleGrids(e.to_string()))?;

        let name = surface_qualified_name(
            &message.product.short_name,
            message.product.level_type,
            message.product.level_value,
        );
        let key = (name, message.product.level_coordinate.to_string());

        let step = message.product.forecast_hour;
        if !steps.contains(&step) {
            steps.push(step);
        }
        if !fields.contains_key(&key) {
            order.push(key.clone());
        }
        fields.entry(key).or_default().insert(step, field);
    }

    steps.sort_unstable();

    let (ny, nx) = (latitudes.len(), longitudes.len());
    let variables = order
        .into_iter()
        .map(|key| {
            let per_step = fields.remove(&key).expect("key was recorded");
            let mut values = Array3::<f32>::from_elem((steps.len(), ny, nx), f32::NAN);
            for (step, field) in per_step {
                let si = steps.binary_search(&step).expect("step was recorded");
                values.index_axis_mut(Axis(0), si).assign(&field);
            }
            GridVariable {
                name: key.0,
                level_coordinate: key.1,
                values,
            }
        })
        .collect();

    Ok(LoadedGrid {
        reference_time,
        steps,
        latitudes,
        longitudes,
        variables,
    })
}

/// Qualify a parameter short name with its fixed surface, matching the names
/// the downstream rename map expects (`t` at 2 m above ground is `t2m`).
fn surface_qualified_name(short_name: &str, level_type: u8, level_value: u32) -> String {
    match (short_name, level_type, level_value) {
        ("t", 103, 2) => "t2m".to_string(),
        ("r", 103, 2) => "r2".to_string(),
        ("dpt", 103, 2) => "d2m".to_string(),
        ("u", 103, 10) => "u10".to_string(),
        ("v", 103, 10) => "v10".to_string(),
        _ => short_name.to_string(),
    }
}
