//! GRIB2 decoder (WMO FM 92 GRIB Edition 2).
//!
//! Decodes the binary grid files served by the atmospheric data API into
//! per-parameter field values plus grid and product metadata. Only the
//! features those files actually use are implemented: latitude/longitude
//! grids (template 3.0) and simple packing (template 5.0), with optional
//! bitmaps. One file may contain several messages (one field each); the
//! decoder walks them all.

pub mod error;
pub mod reader;
pub mod sections;
pub mod tables;
pub mod unpack;

pub use error::{GribError, GribResult};
pub use reader::{decode_all, GribMessage};
pub use sections::{DataRepresentation, GridDefinition, Identification, Indicator, ProductDefinition};
