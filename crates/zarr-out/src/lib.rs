//! Dataset serialization.
//!
//! Collapses a normalised dataset into one array with an explicit `variable`
//! dimension, rechunks it, and writes it out twice per format: once under a
//! timestamp-derived name (the append-only history) and once as `latest`
//! (overwritten each run). Zarr V3 is the chunked archive format, NetCDF-3
//! classic the self-describing single-file one. Destinations are abstracted
//! behind [`ArtifactStore`], picked explicitly by the caller.

pub mod error;
pub mod netcdf;
pub mod persist;
pub mod stack;
pub mod store;
pub mod zarr;

pub use error::{StoreError, StoreResult};
pub use persist::{persist, Format};
pub use stack::{stack, StackedDataset};
pub use store::{ArtifactStore, LocalArtifactStore, ObjectArtifactStore, ObjectStoreConfig};
pub use zarr::{read_zarr, write_zarr};
