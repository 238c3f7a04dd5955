//! Error types for spatial normalisation.

use thiserror::Error;

pub type RegridResult<T> = Result<T, RegridError>;

#[derive(Debug, Error)]
pub enum RegridError {
    #[error("dataset has variables but no spatial coordinates")]
    MissingCoordinates,

    #[error("variable {variable} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        variable: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },
}
