use std::sync::Arc;

use dd_types::Version;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::fetcher::Fetcher;
use crate::registry::FolderRegistry;

/// Outcome counts of a download stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub fetched: usize,
    pub failed: usize,
}

/// Fetch `versions` in consecutive batches of at most `batch_size`.
///
/// A batch runs concurrently and is awaited completely before the next one
/// starts. A version is marked as fetching in `registry` when its task is
/// spawned, and each result, success or failure, is published there, so diff
/// tasks waiting on a version always wake up.
pub async fn download_in_batches(
    fetcher: Arc<dyn Fetcher>,
    registry: Arc<FolderRegistry>,
    versions: Vec<Version>,
    batch_size: usize,
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for batch in versions.chunks(batch_size.max(1)) {
        info!(
            first = %batch[0],
            last = %batch[batch.len() - 1],
            "starting download batch"
        );
        let mut tasks = JoinSet::new();
        for &version in batch {
            registry.mark_fetching(version);
            let fetcher = Arc::clone(&fetcher);
            tasks.spawn(async move { (version, fetcher.fetch(&version).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((version, result)) => {
                    match &result {
                        Ok(_) => summary.fetched += 1,
                        Err(e) => {
                            error!(%version, error = %e, "failed to fetch release");
                            summary.failed += 1;
                        }
                    }
                    registry.publish(version, result);
                }
                Err(e) => {
                    // The version is lost with the panicked task; its waiters
                    // fall back to their timeout.
                    error!(error = %e, "fetch task panicked");
                    summary.failed += 1;
                }
            }
        }
    }

    summary
}
