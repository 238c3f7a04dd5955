//! Normalisation of a merged dataset onto the fixed target grid.

use std::collections::HashMap;

use ndarray::{s, Array4};
use tracing::{debug, info};

use nwp_grid::{DataVariable, Dataset};

use crate::error::{RegridError, RegridResult};
use crate::osgb::OsgbProjection;
use crate::target::{target_grid, TargetGrid, GRID_SPACING_METERS};

/// Map a merged dataset onto the fixed easting/northing grid.
///
/// When the source already has the target shape its coordinates are simply
/// relabelled; otherwise every source point is projected to the National
/// Grid and each variable is resampled by nearest neighbour. Either way the
/// output has exactly the target's rows and columns, with `y` descending
/// (north at the top) and `x` ascending.
pub fn normalize(dataset: Dataset) -> RegridResult<Dataset> {
    let grid = target_grid();

    if dataset.variables.is_empty() {
        // Nothing survived aggregation; still present the fixed coordinates.
        return Ok(Dataset {
            y: grid.northings_descending(),
            x: grid.eastings_ascending(),
            ..dataset
        });
    }

    if dataset.y.is_empty() || dataset.x.is_empty() {
        return Err(RegridError::MissingCoordinates);
    }

    if dataset.y.len() == grid.num_rows() && dataset.x.len() == grid.num_cols() {
        debug!("source already on target shape, substituting coordinates");
        substitute(dataset, grid)
    } else {
        debug!(
            source_rows = dataset.y.len(),
            source_cols = dataset.x.len(),
            "resampling onto target grid"
        );
        resample(dataset, grid)
    }
}

/// Cheap path: relabel coordinates, flipping rows if the source runs south
/// to north.
fn substitute(mut dataset: Dataset, grid: &TargetGrid) -> RegridResult<Dataset> {
    let ascending = dataset.y.len() >= 2 && dataset.y[0] < dataset.y[1];
    if ascending {
        for variable in &mut dataset.variables {
            variable.values = variable.values.slice(s![.., .., ..;-1, ..]).to_owned();
        }
    }

    dataset.y = grid.northings_descending();
    dataset.x = grid.eastings_ascending();
    Ok(dataset)
}

/// General path: project source latitudes/longitudes to the National Grid
/// and resample each variable by nearest neighbour, slice by slice.
fn resample(dataset: Dataset, grid: &TargetGrid) -> RegridResult<Dataset> {
    let (src_rows, src_cols) = (dataset.y.len(), dataset.x.len());

    let projection = OsgbProjection::new();
    let mut points = Vec::with_capacity(src_rows * src_cols);
    for &lat in &dataset.y {
        for &lon in &dataset.x {
            points.push(projection.project(lat, lon));
        }
    }

    let index = NearestIndex::new(&points);

    let y = grid.northings_descending();
    let x = grid.eastings_ascending();
    let (rows, cols) = (y.len(), x.len());

    // One source index per target cell, shared by every variable and slice.
    let mut mapping = Vec::with_capacity(rows * cols);
    for &northing in &y {
        for &easting in &x {
            mapping.push(index.nearest(easting, northing));
        }
    }

    let mut variables = Vec::with_capacity(dataset.variables.len());
    for variable in dataset.variables {
        let (nt, ns, vy, vx) = variable.values.dim();
        if (vy, vx) != (src_rows, src_cols) {
            return Err(RegridError::ShapeMismatch {
                variable: variable.name,
                expected: (src_rows, src_cols),
                actual: (vy, vx),
            });
        }

        let mut values = Array4::<f32>::from_elem((nt, ns, rows, cols), f32::NAN);
        // The lookup works on 2-D slices, so walk the leading axes.
        for t in 0..nt {
            for step in 0..ns {
                let slice = variable.values.slice(s![t, step, .., ..]);
                for r in 0..rows {
                    for c in 0..cols {
                        let src = mapping[r * cols + c];
                        values[[t, step, r, c]] = slice[[src / src_cols, src % src_cols]];
                    }
                }
            }
        }

        variables.push(DataVariable {
            name: variable.name,
            values,
        });
    }

    info!(rows, cols, variables = variables.len(), "resampled dataset");

    Ok(Dataset {
        times: dataset.times,
        steps: dataset.steps,
        y,
        x,
        variables,
    })
}

/// Nearest-neighbour lookup over scattered projected points, bucketed so a
/// query only touches nearby points.
struct NearestIndex<'a> {
    points: &'a [(f64, f64)],
    buckets: HashMap<(i64, i64), Vec<usize>>,
    /// Bucket edge length, sized for roughly one point per bucket.
    cell: f64,
}

impl<'a> NearestIndex<'a> {
    fn new(points: &'a [(f64, f64)]) -> Self {
        let (mut min_e, mut max_e) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_n, mut max_n) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(e, n) in points {
            min_e = min_e.min(e);
            max_e = max_e.max(e);
            min_n = min_n.min(n);
            max_n = max_n.max(n);
        }
        let extent = (max_e - min_e).max(max_n - min_n).max(1.0);
        let cell = (extent / (points.len() as f64).sqrt()).max(GRID_SPACING_METERS);

        let mut buckets: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (idx, &(e, n)) in points.iter().enumerate() {
            let key = ((e / cell).floor() as i64, (n / cell).floor() as i64);
            buckets.entry(key).or_default().push(idx);
        }
        Self {
            points,
            buckets,
            cell,
        }
    }

    /// Index of the point closest to `(easting, northing)`. There is no
    /// cutoff distance: every target cell takes its nearest source point.
    fn nearest(&self, easting: f64, northing: f64) -> usize {
        let ke = (easting / self.cell).floor() as i64;
        let kn = (northing / self.cell).floor() as i64;

        let mut best: Option<(f64, usize)> = None;
        let mut radius: i64 = 0;
        loop {
            for (de, dn) in ring(radius) {
                if let Some(members) = self.buckets.get(&(ke + de, kn + dn)) {
                    for &idx in members {
                        let (pe, pn) = self.points[idx];
                        let d2 = (pe - easting).powi(2) + (pn - northing).powi(2);
                        if best.map_or(true, |(bd, _)| d2 < bd) {
                            best = Some((d2, idx));
                        }
                    }
                }
            }

            // Any unscanned point is at least `radius * cell` away, so stop
            // once the best match is provably closer than that.
            if let Some((d2, idx)) = best {
                let ring_floor = (radius as f64) * self.cell;
                if ring_floor * ring_floor > d2 {
                    return idx;
                }
            }
            radius += 1;
        }
    }
}

/// Bucket offsets forming the square ring at `radius`.
fn ring(radius: i64) -> Vec<(i64, i64)> {
    if radius == 0 {
        return vec![(0, 0)];
    }
    let mut offsets = Vec::with_capacity((8 * radius) as usize);
    for d in -radius..=radius {
        offsets.push((d, radius));
        offsets.push((d, -radius));
    }
    for d in (-radius + 1)..radius {
        offsets.push((radius, d));
        offsets.push((-radius, d));
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ndarray::Array4;

    fn dataset_with(y: Vec<f64>, x: Vec<f64>, value: f32) -> Dataset {
        let values = Array4::from_elem((1, 2, y.len(), x.len()), value);
        Dataset {
            times: vec![Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()],
            steps: vec![0, 3],
            y,
            x,
            variables: vec![DataVariable {
                name: "t".to_string(),
                values,
            }],
        }
    }

    #[test]
    fn direct_substitution_keeps_target_shape() {
        let grid = target_grid();
        // Source already on the target shape, rows north to south.
        let y: Vec<f64> = (0..grid.num_rows()).map(|r| 60.0 - r as f64 * 0.01).collect();
        let x: Vec<f64> = (0..grid.num_cols()).map(|c| -11.0 + c as f64 * 0.01).collect();
        let ds = normalize(dataset_with(y, x, 5.0)).unwrap();

        assert_eq!(ds.y.len(), 639);
        assert_eq!(ds.x.len(), 455);
        assert!(ds.y[0] > ds.y[638], "y should be north to south");
        assert_eq!(ds.variables[0].values[[0, 0, 0, 0]], 5.0);
    }

    #[test]
    fn direct_substitution_flips_ascending_rows() {
        let grid = target_grid();
        let y: Vec<f64> = (0..grid.num_rows()).map(|r| 49.0 + r as f64 * 0.01).collect();
        let x: Vec<f64> = (0..grid.num_cols()).map(|c| -11.0 + c as f64 * 0.01).collect();

        let mut source = dataset_with(y, x, 0.0);
        // Mark the southernmost source row; after the flip it must be the
        // bottom row of the output.
        source.variables[0]
            .values
            .slice_mut(s![.., .., 0, ..])
            .fill(9.0);

        let ds = normalize(source).unwrap();
        assert_eq!(ds.variables[0].values[[0, 0, 638, 0]], 9.0);
        assert_ne!(ds.variables[0].values[[0, 0, 0, 0]], 9.0);
    }

    #[test]
    fn resampling_always_yields_target_shape() {
        // Coarse 10x10 degree grid over the UK.
        let y: Vec<f64> = (0..10).map(|r| 59.0 - r as f64).collect();
        let x: Vec<f64> = (0..10).map(|c| -8.0 + c as f64).collect();
        let ds = normalize(dataset_with(y, x, 7.5)).unwrap();

        assert_eq!(ds.y.len(), 639);
        assert_eq!(ds.x.len(), 455);
        let values = &ds.variables[0].values;
        assert_eq!(values.dim(), (1, 2, 639, 455));
        // Constant source, so every resampled cell carries the constant.
        assert!(values.iter().all(|v| (*v - 7.5).abs() < 1e-6));
    }

    #[test]
    fn empty_dataset_gets_target_coordinates() {
        let ds = normalize(Dataset {
            times: vec![],
            steps: vec![],
            y: vec![],
            x: vec![],
            variables: vec![],
        })
        .unwrap();

        assert!(ds.variables.is_empty());
        assert_eq!(ds.y.len(), 639);
        assert_eq!(ds.x.len(), 455);
    }

    #[test]
    fn nearest_index_picks_closest_point() {
        let points = vec![(0.0, 0.0), (10_000.0, 0.0), (0.0, 10_000.0)];
        let index = NearestIndex::new(&points);

        assert_eq!(index.nearest(100.0, 100.0), 0);
        assert_eq!(index.nearest(9_000.0, 500.0), 1);
        assert_eq!(index.nearest(-500.0, 12_000.0), 2);
    }
}
