//! In-memory NWP dataset model, grid file loading and aggregation.
//!
//! [`loader::load`] turns one downloaded grid file into a [`LoadedGrid`];
//! [`aggregate::aggregate`] folds many loaded files into a single [`Dataset`]
//! with shared `time`, `step`, `y`, `x` coordinates.

pub mod aggregate;
pub mod dataset;
pub mod error;
pub mod loader;

pub use aggregate::{aggregate, SourceFile};
pub use dataset::{DataVariable, Dataset, DatasetBuilder, GridVariable, LoadedGrid};
pub use error::{GridError, GridResult};
pub use loader::{load, load_bytes};
