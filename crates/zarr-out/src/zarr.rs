//! Zarr V3 reading and writing for stacked datasets.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ndarray::Array5;
use serde_json::json;
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::storage::ReadableWritableStorage;
use zarrs_storage::StorePrefix;

use crate::error::{StoreError, StoreResult};
use crate::stack::{StackedDataset, ARRAY_NAME};

/// Blosc zstd compression level for the archive chunks.
const COMPRESSION_LEVEL: u8 = 5;

/// Write a stacked dataset as a Zarr V3 array at `node_path` (e.g.
/// `/latest.zarr`), replacing whatever was there.
pub fn write_zarr(
    storage: ReadableWritableStorage,
    node_path: &str,
    dataset: &StackedDataset,
) -> StoreResult<()> {
    // Clear any previous artifact under this name so stale chunks from a
    // bigger earlier run cannot survive the overwrite.
    let prefix = StorePrefix::new(format!("{}/", node_path.trim_matches('/')))
        .map_err(|e| StoreError::Zarr(e.to_string()))?;
    storage
        .erase_prefix(&prefix)
        .map_err(|e| StoreError::Zarr(e.to_string()))?;

    let chunk_grid: zarrs::array::ChunkGrid = dataset
        .chunk_shape()
        .to_vec()
        .try_into()
        .map_err(|e| StoreError::Zarr(format!("{:?}", e)))?;

    let mut attrs = serde_json::Map::new();
    attrs.insert("_ARRAY_DIMENSIONS".to_string(), json!(["variable", "init_time", "step", "y", "x"]));
    attrs.insert("variable".to_string(), json!(dataset.variables));
    attrs.insert(
        "init_time".to_string(),
        json!(dataset
            .init_times
            .iter()
            .map(|t| t.to_rfc3339())
            .collect::<Vec<_>>()),
    );
    attrs.insert("step".to_string(), json!(dataset.steps));
    attrs.insert("y".to_string(), json!(dataset.y));
    attrs.insert("x".to_string(), json!(dataset.x));

    let level = BloscCompressionLevel::try_from(COMPRESSION_LEVEL)
        .map_err(|e| StoreError::Zarr(e.to_string()))?;
    let codec = BloscCodec::new(
        BloscCompressor::Zstd,
        level,
        None,
        BloscShuffleMode::Shuffle,
        Some(std::mem::size_of::<f32>()),
    )
    .map_err(|e| StoreError::Zarr(e.to_string()))?;

    let mut builder = ArrayBuilder::new(
        dataset.shape().to_vec(),
        DataType::Float32,
        chunk_grid,
        FillValue::from(f32::NAN),
    );
    let array = builder
        .attributes(attrs)
        .bytes_to_bytes_codecs(vec![Arc::new(codec)])
        .build(storage, node_path)
        .map_err(|e| StoreError::Zarr(e.to_string()))?;

    array
        .store_metadata()
        .map_err(|e| StoreError::Zarr(e.to_string()))?;

    let subset = ArraySubset::new_with_start_shape(vec![0; 5], dataset.shape().to_vec())
        .map_err(|e| StoreError::Zarr(e.to_string()))?;
    let elements: Vec<f32> = dataset.values.iter().copied().collect();
    array
        .store_array_subset_elements(&subset, &elements)
        .map_err(|e| StoreError::Zarr(e.to_string()))?;

    Ok(())
}

/// Read a stacked dataset back from a Zarr artifact.
pub fn read_zarr(
    storage: ReadableWritableStorage,
    node_path: &str,
) -> StoreResult<StackedDataset> {
    let array =
        Array::open(storage, node_path).map_err(|e| StoreError::Zarr(e.to_string()))?;

    let shape = array.shape().to_vec();
    if shape.len() != 5 {
        return Err(StoreError::InvalidArtifact(format!(
            "expected 5 dimensions, found {}",
            shape.len()
        )));
    }

    let subset = ArraySubset::new_with_start_shape(vec![0; 5], shape.clone())
        .map_err(|e| StoreError::Zarr(e.to_string()))?;
    let elements: Vec<f32> = array
        .retrieve_array_subset_elements(&subset)
        .map_err(|e| StoreError::Zarr(e.to_string()))?;

    let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
    let values = Array5::from_shape_vec((dims[0], dims[1], dims[2], dims[3], dims[4]), elements)
        .map_err(|e| StoreError::Shape(e.to_string()))?;

    let attrs = array.attributes();
    let attr = |key: &str| {
        attrs
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::InvalidArtifact(format!("missing attribute {}", key)))
    };

    let init_times: Vec<String> = serde_json::from_value(attr("init_time")?)?;
    let init_times: Vec<DateTime<Utc>> = init_times
        .iter()
        .map(|t| {
            DateTime::parse_from_rfc3339(t)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| StoreError::InvalidArtifact(e.to_string()))
        })
        .collect::<StoreResult<_>>()?;

    Ok(StackedDataset {
        variables: serde_json::from_value(attr("variable")?)?,
        init_times,
        steps: serde_json::from_value(attr("step")?)?,
        y: serde_json::from_value(attr("y")?)?,
        x: serde_json::from_value(attr("x")?)?,
        values,
    })
}

/// Artifact name (node path component) for the Zarr copies.
pub fn artifact_name(stem: &str) -> String {
    format!("{}.zarr", stem)
}

/// Node path of the array inside the destination store.
pub fn node_path(name: &str) -> String {
    format!("/{}", name)
}
