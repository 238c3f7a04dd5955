//! Client for the Met Office Weather DataHub order API.
//!
//! Wraps the REST endpoints with typed models, resolves the latest file
//! manifest for a set of orders (dropping the run-relative duplicate
//! entries the API repeats under `+HH` markers), and downloads GRIB payloads
//! into a local cache keyed by order and file id.

mod client;
mod error;
mod fetcher;
mod file_id;
mod models;
mod resolver;

pub use client::DataHubClient;
pub use error::{ClientError, ClientResult};
pub use fetcher::{cache_path, fetch, FetchedFile};
pub use file_id::FileId;
pub use models::{
    Extent, File, FileDetails, OrderDetails, OrderInfo, OrderList, ParameterDetails, RunDetails,
    RunList, RunListForModel,
};
pub use resolver::{resolve, ResolvedFile};
