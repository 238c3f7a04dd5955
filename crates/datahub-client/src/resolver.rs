//! Manifest resolution across orders.

use tracing::{debug, info, warn};

use crate::client::DataHubClient;
use crate::error::ClientResult;
use crate::file_id::FileId;
use crate::models::File;

/// One downloadable file, with its parsed id.
#[derive(Debug, Clone)]
pub struct ResolvedFile {
    pub order_id: String,
    pub file: File,
    pub file_id: FileId,
}

/// Resolve the latest manifests for the given orders (or every order on the
/// account when `order_ids` is `None`) into the list of files worth
/// downloading.
///
/// Run-relative duplicate entries (`+HH` markers) are dropped here so the
/// fetcher never touches them; ids the grammar rejects are skipped with a
/// warning rather than failing the run.
pub async fn resolve(
    client: &DataHubClient,
    order_ids: Option<&[String]>,
) -> ClientResult<Vec<ResolvedFile>> {
    let order_ids: Vec<String> = match order_ids {
        Some(ids) => ids.to_vec(),
        None => client
            .get_orders()
            .await?
            .orders
            .into_iter()
            .map(|order| order.order_id)
            .collect(),
    };

    let mut resolved = Vec::new();
    for order_id in &order_ids {
        let details = client.get_latest_order(order_id).await?;
        let total = details.files.len();
        let mut kept = 0usize;

        for file in details.files {
            let file_id = match FileId::parse(&file.file_id) {
                Ok(file_id) => file_id,
                Err(e) => {
                    warn!(order_id, error = %e, "skipping unparseable file id");
                    continue;
                }
            };
            if file_id.is_duplicate() {
                debug!(order_id, file_id = %file_id.as_str(), "skipping duplicate entry");
                continue;
            }
            kept += 1;
            resolved.push(ResolvedFile {
                order_id: order_id.clone(),
                file,
                file_id,
            });
        }

        info!(order_id, total, kept, "resolved latest manifest");
    }

    Ok(resolved)
}
