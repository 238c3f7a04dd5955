//! Error types for grid loading and aggregation.

use thiserror::Error;

pub type GridResult<T> = Result<T, GridError>;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("failed to read grid file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode grid file: {0}")]
    Decode(#[from] grib_decode::GribError),

    #[error("incompatible grids: {0}")]
    IncompatibleGrids(String),
}
