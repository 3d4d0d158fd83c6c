use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dd_driver::{DiffDriver, DiffReport, PreviousRelease};
use dd_fetch::{download_in_batches, BatchSummary, Fetcher, FolderRegistry};
use dd_types::Version;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{error, info};

/// A release whose diff could not run at all.
#[derive(Clone, Debug, Serialize)]
pub struct PairFailure {
    pub version: Version,
    pub error: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct RunSummary {
    pub fetched: usize,
    pub fetch_failures: usize,
    /// Oldest first.
    pub reports: Vec<DiffReport>,
    pub failed_pairs: Vec<PairFailure>,
}

/// Connects the download stage to one diff task per release.
///
/// Downloads run in bounded batches in the background. Every release gets a
/// diff task up front that waits, through the shared [`FolderRegistry`],
/// for its own folder and its predecessor's. All tasks are joined before
/// [`Orchestrator::run`] returns.
pub struct Orchestrator {
    driver: DiffDriver,
    fetcher: Arc<dyn Fetcher>,
    registry: Arc<FolderRegistry>,
    batch_size: usize,
    wait_timeout: Duration,
}

impl Orchestrator {
    pub fn new(driver: DiffDriver, fetcher: Arc<dyn Fetcher>, batch_size: usize, wait_timeout: Duration) -> Self {
        Self {
            driver,
            fetcher,
            registry: Arc::new(FolderRegistry::new()),
            batch_size,
            wait_timeout,
        }
    }

    /// Process `versions` (oldest first). The first one is the base release
    /// and is copied whole; each later one is diffed against its predecessor.
    pub async fn run(&self, versions: Vec<Version>) -> anyhow::Result<RunSummary> {
        info!(count = versions.len(), batch_size = self.batch_size, "starting run");

        let downloads = tokio::spawn(download_in_batches(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.registry),
            versions.clone(),
            self.batch_size,
        ));

        let mut diffs = JoinSet::new();
        let mut previous = None;
        for &next in &versions {
            let driver = self.driver.clone();
            let registry = Arc::clone(&self.registry);
            let wait = self.wait_timeout;
            diffs.spawn(async move {
                let result = diff_pair(driver, registry, previous, next, wait).await;
                (next, result)
            });
            previous = Some(next);
        }

        let BatchSummary { fetched, failed } = downloads.await.context("download stage panicked")?;
        let mut summary = RunSummary {
            fetched,
            fetch_failures: failed,
            ..Default::default()
        };

        while let Some(joined) = diffs.join_next().await {
            let (version, result) = joined.context("diff task panicked")?;
            match result {
                Ok(report) => summary.reports.push(report),
                Err(e) => {
                    let message = format!("{e:#}");
                    error!(%version, error = %message, "release diff did not run");
                    summary.failed_pairs.push(PairFailure { version, error: message });
                }
            }
        }

        summary.reports.sort_by_key(|r| r.next);
        summary.failed_pairs.sort_by_key(|f| f.version);
        Ok(summary)
    }
}

async fn diff_pair(
    driver: DiffDriver,
    registry: Arc<FolderRegistry>,
    previous: Option<Version>,
    next: Version,
    wait: Duration,
) -> anyhow::Result<DiffReport> {
    let next_folder = registry
        .wait(next, wait)
        .await
        .with_context(|| format!("waiting for release {next}"))?;
    let previous = match previous {
        Some(version) => {
            let folder = registry
                .wait(version, wait)
                .await
                .with_context(|| format!("waiting for previous release {version}"))?;
            Some(PreviousRelease::new(version, folder))
        }
        None => None,
    };
    Ok(driver.run(previous, next, next_folder).await?)
}
