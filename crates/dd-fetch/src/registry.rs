use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dd_types::Version;
use tokio::sync::watch;

use crate::error::{FetchError, FetchResult};

/// Availability of one release's extracted folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FolderState {
    /// Not dispatched to a fetcher yet.
    Pending,
    /// A fetcher is working on it.
    Fetching,
    Ready(PathBuf),
    Failed(String),
}

impl FolderState {
    /// Whether the fetch has finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready(_) | Self::Failed(_))
    }
}

/// Hands extracted folders from the download stage to the diff stage.
///
/// Every version gets one watch slot, created by whichever side touches it
/// first. The download stage marks a version as fetching when it dispatches
/// it and publishes the result exactly once; any number of diff tasks may
/// wait on the same slot.
#[derive(Default)]
pub struct FolderRegistry {
    slots: Mutex<HashMap<Version, watch::Sender<FolderState>>>,
}

impl FolderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<Version, watch::Sender<FolderState>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, version: Version) -> watch::Receiver<FolderState> {
        self.slots()
            .entry(version)
            .or_insert_with(|| watch::channel(FolderState::Pending).0)
            .subscribe()
    }

    /// Record that a fetcher has started on `version`. Waiters start their
    /// timeout from here.
    pub fn mark_fetching(&self, version: Version) {
        self.slots()
            .entry(version)
            .or_insert_with(|| watch::channel(FolderState::Pending).0)
            .send_if_modified(|state| {
                if *state == FolderState::Pending {
                    *state = FolderState::Fetching;
                    true
                } else {
                    false
                }
            });
    }

    /// Record the outcome of fetching `version`, waking all waiters.
    pub fn publish(&self, version: Version, result: FetchResult<PathBuf>) {
        let state = match result {
            Ok(path) => FolderState::Ready(path),
            Err(e) => FolderState::Failed(e.to_string()),
        };
        self.slots()
            .entry(version)
            .or_insert_with(|| watch::channel(FolderState::Pending).0)
            .send_replace(state);
    }

    /// Current state without waiting.
    pub fn state(&self, version: &Version) -> FolderState {
        self.slots()
            .get(version)
            .map(|tx| tx.borrow().clone())
            .unwrap_or(FolderState::Pending)
    }

    /// Wait until `version` is published.
    ///
    /// A version that has not been dispatched yet is waited on without a
    /// limit; `timeout` only bounds the time from [`mark_fetching`] to the
    /// published result.
    ///
    /// [`mark_fetching`]: FolderRegistry::mark_fetching
    pub async fn wait(&self, version: Version, timeout: Duration) -> FetchResult<PathBuf> {
        let mut rx = self.slot(version);
        let closed = || FetchError::Unavailable {
            version,
            reason: "registry closed".into(),
        };

        rx.wait_for(|s| *s != FolderState::Pending).await.map_err(|_| closed())?;

        let state = match tokio::time::timeout(timeout, rx.wait_for(FolderState::is_settled)).await {
            Err(_) => {
                return Err(FetchError::Timeout {
                    version,
                    waited: timeout,
                })
            }
            Ok(Err(_)) => return Err(closed()),
            Ok(Ok(state)) => state.clone(),
        };

        match state {
            FolderState::Ready(path) => Ok(path),
            FolderState::Failed(reason) => Err(FetchError::Unavailable { version, reason }),
            FolderState::Pending | FolderState::Fetching => Err(closed()),
        }
    }
}
