//! Artifact destinations.
//!
//! Where artifacts land is a capability the caller picks explicitly, not
//! something inferred from the shape of a path string: [`LocalArtifactStore`]
//! writes under a directory, [`ObjectArtifactStore`] under an S3-compatible
//! bucket.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::ObjectStore;
use tracing::debug;
use zarrs::storage::ReadableWritableStorage;
use zarrs_filesystem::FilesystemStore;
use zarrs_object_store::AsyncObjectStore;
use zarrs_storage::storage_adapter::async_to_sync::{
    AsyncToSyncBlockOn, AsyncToSyncStorageAdapter,
};

use crate::error::{StoreError, StoreResult};

/// A destination for persisted artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Zarr storage rooted at the destination; artifacts are nodes under it.
    fn zarr_storage(&self) -> StoreResult<ReadableWritableStorage>;

    /// Publish a single-file artifact from a local scratch path under `name`,
    /// without readers ever observing a half-written file.
    async fn put_file(&self, name: &str, scratch: &Path) -> StoreResult<()>;
}

/// Artifacts under a local directory.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    fn zarr_storage(&self) -> StoreResult<ReadableWritableStorage> {
        std::fs::create_dir_all(&self.root)?;
        let store =
            FilesystemStore::new(&self.root).map_err(|e| StoreError::Zarr(e.to_string()))?;
        Ok(Arc::new(store))
    }

    async fn put_file(&self, name: &str, scratch: &Path) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        // Copy to a sibling temporary name, then rename into place; rename
        // within one directory is atomic.
        let tmp = self.root.join(format!("{}.tmp", name));
        let target = self.root.join(name);
        tokio::fs::copy(scratch, &tmp).await?;
        tokio::fs::rename(&tmp, &target).await?;
        debug!(target = %target.display(), "published file artifact");
        Ok(())
    }
}

/// Connection settings for an S3-compatible destination.
#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    /// Endpoint URL, e.g. `https://s3.eu-west-1.amazonaws.com`.
    pub endpoint: Option<String>,
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Allow plain HTTP (local S3 stand-ins).
    pub allow_http: bool,
    /// Key prefix inside the bucket.
    pub prefix: String,
}

impl ObjectStoreConfig {
    /// Read the connection settings from the environment.
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("S3_ENDPOINT").ok(),
            bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "nwp-data".to_string()),
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "eu-west-1".to_string()),
            access_key_id: std::env::var("S3_ACCESS_KEY").unwrap_or_default(),
            secret_access_key: std::env::var("S3_SECRET_KEY").unwrap_or_default(),
            allow_http: std::env::var("S3_ALLOW_HTTP")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            prefix: std::env::var("S3_PREFIX").unwrap_or_default(),
        }
    }
}

/// Artifacts under an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct ObjectArtifactStore {
    config: ObjectStoreConfig,
}

impl ObjectArtifactStore {
    pub fn new(config: ObjectStoreConfig) -> Self {
        Self { config }
    }

    fn client(&self) -> StoreResult<object_store::aws::AmazonS3> {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&self.config.bucket)
            .with_region(&self.config.region)
            .with_access_key_id(&self.config.access_key_id)
            .with_secret_access_key(&self.config.secret_access_key)
            .with_allow_http(self.config.allow_http);
        if let Some(endpoint) = &self.config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        Ok(builder.build()?)
    }

    fn key(&self, name: &str) -> object_store::path::Path {
        if self.config.prefix.is_empty() {
            object_store::path::Path::from(name)
        } else {
            object_store::path::Path::from(format!("{}/{}", self.config.prefix, name))
        }
    }
}

#[async_trait]
impl ArtifactStore for ObjectArtifactStore {
    fn zarr_storage(&self) -> StoreResult<ReadableWritableStorage> {
        let s3 = self.client()?;
        let async_store = Arc::new(AsyncObjectStore::new(s3));
        let sync_store = AsyncToSyncStorageAdapter::new(async_store, TokioBlockOn);
        Ok(Arc::new(sync_store))
    }

    async fn put_file(&self, name: &str, scratch: &Path) -> StoreResult<()> {
        let client = self.client()?;
        let bytes = tokio::fs::read(scratch).await?;

        // Upload under a temporary key, then rename over the final one so a
        // reader never sees a partial object.
        let tmp = self.key(&format!("{}.tmp", name));
        let target = self.key(name);
        client.put(&tmp, bytes.into()).await?;
        client.rename(&tmp, &target).await?;
        debug!(key = %target, "published file artifact");
        Ok(())
    }
}

/// Blocking executor for the async-to-sync storage adapter that is safe to
/// use from inside a tokio runtime.
#[derive(Clone, Copy)]
struct TokioBlockOn;

impl AsyncToSyncBlockOn for TokioBlockOn {
    fn block_on<F: core::future::Future>(&self, future: F) -> F::Output {
        // block_in_place moves the task off the async worker thread so
        // block_on does not nest runtimes.
        tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
    }
}
