//! The fixed target grid.
//!
//! A regular 2 km easting/northing grid covering the UK model domain. The
//! bounding box matches the gridded-data region selection for the UK model,
//! pulled in by half a grid cell on each side so every cell centre falls
//! inside the source extent.

use std::sync::LazyLock;

pub const GRID_SPACING_METERS: f64 = 2_000.0;

const NORTH: f64 = 1_262_937.252_001_507_2 - 4_000.0;
const SOUTH: f64 = -22_383.689_507_050_31 + 4_000.0;
const EAST: f64 = 704_564.752_242_352_1 - 4_000.0;
const WEST: f64 = -212_346.970_187_821_2 + 4_000.0;

/// Cell-centre coordinates of the fixed grid.
#[derive(Debug)]
pub struct TargetGrid {
    /// Northings, ascending (south to north).
    pub northings: Vec<i32>,
    /// Eastings, ascending (west to east).
    pub eastings: Vec<i32>,
}

impl TargetGrid {
    pub fn num_rows(&self) -> usize {
        self.northings.len()
    }

    pub fn num_cols(&self) -> usize {
        self.eastings.len()
    }

    /// Northings north-to-south, as the normalised `y` coordinate.
    pub fn northings_descending(&self) -> Vec<f64> {
        self.northings.iter().rev().map(|&n| n as f64).collect()
    }

    /// Eastings west-to-east, as the normalised `x` coordinate.
    pub fn eastings_ascending(&self) -> Vec<f64> {
        self.eastings.iter().map(|&e| e as f64).collect()
    }
}

static TARGET_GRID: LazyLock<TargetGrid> = LazyLock::new(|| TargetGrid {
    northings: coordinate_range(SOUTH, NORTH),
    eastings: coordinate_range(WEST, EAST),
});

/// The process-wide target grid, computed once.
pub fn target_grid() -> &'static TargetGrid {
    &TARGET_GRID
}

/// Half-open `[start, stop)` range at the grid spacing, truncated to whole
/// metres.
fn coordinate_range(start: f64, stop: f64) -> Vec<i32> {
    let count = ((stop - start) / GRID_SPACING_METERS).ceil() as usize;
    (0..count)
        .map(|k| (start + k as f64 * GRID_SPACING_METERS) as i32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_expected_shape() {
        let grid = target_grid();
        assert_eq!(grid.num_rows(), 639);
        assert_eq!(grid.num_cols(), 455);
    }

    #[test]
    fn grid_starts_at_expected_corners() {
        let grid = target_grid();
        assert_eq!(grid.northings[0], -18_383);
        assert_eq!(grid.eastings[0], -208_346);
    }

    #[test]
    fn spacing_is_two_kilometres() {
        let grid = target_grid();
        for pair in grid.northings.windows(2) {
            let d = pair[1] - pair[0];
            assert!((1_999..=2_000).contains(&d), "northing spacing {}", d);
        }
    }

    #[test]
    fn descending_northings_start_north() {
        let grid = target_grid();
        let y = grid.northings_descending();
        assert!(y[0] > y[y.len() - 1]);
        assert_eq!(y.len(), grid.num_rows());
    }
}
