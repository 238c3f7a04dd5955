//! Spatial normalisation onto a fixed 2 km easting/northing grid.
//!
//! Merged datasets arrive on whatever grid the source files use. This crate
//! maps them onto one fixed target grid so downstream consumers always see
//! the same `y`/`x` coordinates: either by direct coordinate substitution
//! when the source already has the target shape, or by projecting source
//! latitudes/longitudes to eastings/northings and resampling.

pub mod error;
pub mod normalize;
pub mod osgb;
pub mod target;

pub use error::{RegridError, RegridResult};
pub use normalize::normalize;
pub use osgb::OsgbProjection;
pub use target::{target_grid, TargetGrid, GRID_SPACING_METERS};
