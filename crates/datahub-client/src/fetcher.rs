//! Downloading manifest files into the local cache.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::client::DataHubClient;
use crate::error::ClientResult;
use crate::resolver::ResolvedFile;

/// A resolved file together with its place in the cache.
#[derive(Debug, Clone)]
pub struct FetchedFile {
    pub resolved: ResolvedFile,
    pub path: PathBuf,
}

/// Cache location of one file. One flat directory, keyed by order and file
/// id so distinct orders never collide.
pub fn cache_path(cache_dir: &Path, order_id: &str, file_id: &str) -> PathBuf {
    cache_dir.join(format!("{}_{}.grib", order_id, file_id))
}

/// Download every resolved file that is not already cached.
///
/// Files are fetched one at a time; a file whose cache path already exists
/// is not re-downloaded.
pub async fn fetch(
    client: &DataHubClient,
    cache_dir: &Path,
    resolved: &[ResolvedFile],
) -> ClientResult<Vec<FetchedFile>> {
    fs::create_dir_all(cache_dir).await?;

    let mut fetched = Vec::with_capacity(resolved.len());
    let mut downloaded = 0usize;
    for entry in resolved {
        let path = cache_path(cache_dir, &entry.order_id, entry.file_id.as_str());
        if path.exists() {
            debug!(path = %path.display(), "cache hit");
        } else {
            let bytes = client
                .download(&entry.order_id, entry.file_id.as_str())
                .await?;
            fs::write(&path, &bytes).await?;
            downloaded += 1;
            debug!(path = %path.display(), bytes = bytes.len(), "downloaded");
        }
        fetched.push(FetchedFile {
            resolved: entry.clone(),
            path,
        });
    }

    info!(
        total = resolved.len(),
        downloaded,
        cached = resolved.len() - downloaded,
        "fetched manifest files"
    );
    Ok(fetched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_id::FileId;
    use crate::models::File;
    use chrono::Utc;

    fn resolved(order_id: &str, file_id: &str) -> ResolvedFile {
        ResolvedFile {
            order_id: order_id.to_string(),
            file: File {
                file_id: file_id.to_string(),
                run_date_time: Utc::now(),
                run: 6,
            },
            file_id: FileId::parse(file_id).unwrap(),
        }
    }

    #[test]
    fn cache_path_is_order_and_file_keyed() {
        let path = cache_path(Path::new("/tmp/cache"), "order-a", "agl_temperature_00");
        assert_eq!(
            path,
            Path::new("/tmp/cache/order-a_agl_temperature_00.grib")
        );
    }

    #[tokio::test]
    async fn cached_files_skip_the_network() {
        let dir = tempfile::tempdir().unwrap();
        let entry = resolved("order-a", "agl_temperature_00");
        let path = cache_path(dir.path(), "order-a", "agl_temperature_00");
        fs::write(&path, b"GRIB").await.unwrap();

        // An unroutable base URL: any network call would fail the test.
        let client = DataHubClient::with_base_url("key", "secret", "http://127.0.0.1:9").unwrap();
        let fetched = fetch(&client, dir.path(), &[entry]).await.unwrap();

        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].path, path);
    }
}
