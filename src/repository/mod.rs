// src/repository/mod.rs

//! Repository objects and the worker-pool plumbing shared by the
//! mirror and snapshot pipelines
//!
//! A `Repository` bundles the local tree, the remote base URL and the HTTP
//! client. The pipelines hang off it as methods: `sync_meta` (atomic
//! metadata refresh), `sync` (package download pool) and `snapshot`
//! (copy/link pool). Channels are created per call and die with it.

mod fetch;
mod snapshot;
mod sync;
mod transport;

pub use fetch::{fetch, fetch_verified};
pub use snapshot::SnapshotOptions;
pub use sync::SyncStats;
pub use transport::ClientConfig;

use crate::error::Result;
use crate::package::{PackageRecord, TransferResult};
use crate::primary::CancelFlag;
use crate::repomd::RepoIndex;
use reqwest::blocking::Client;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// A single RPM repository: local tree, remote base URL, HTTP client.
#[derive(Debug)]
pub struct Repository {
    local_path: PathBuf,
    remote_url: String,
    /// Display name, used only in log output and repo-file selection
    pub name: String,
    /// Enabled flag as read from a repo file
    pub enabled: bool,
    client: Client,
}

impl Repository {
    /// Create a repository with a default HTTP transport.
    pub fn new(local: impl AsRef<Path>, remote: &str) -> Result<Self> {
        Ok(Self::with_client(
            local,
            remote,
            ClientConfig::default().build()?,
        ))
    }

    /// Create a repository around an already-configured HTTP client.
    pub fn with_client(local: impl AsRef<Path>, remote: &str, client: Client) -> Self {
        Self {
            local_path: normalize_path(local.as_ref()),
            remote_url: remote.trim_end_matches('/').to_string(),
            name: String::new(),
            enabled: false,
            client,
        }
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn remote_join(&self, rel: &str) -> String {
        format!("{}/{}", self.remote_url, rel)
    }

    /// Load the repository index, preferring a staged one left behind by an
    /// interrupted metadata sync over the published one.
    pub(crate) fn index(&self) -> Result<RepoIndex> {
        let staged = self.local_path.join(".newrepodata").join("repomd.xml");
        if staged.is_file() {
            return RepoIndex::load(&staged);
        }
        RepoIndex::load(&self.local_path.join("repodata").join("repomd.xml"))
    }
}

fn normalize_path(path: &Path) -> PathBuf {
    PathBuf::from(path.to_string_lossy().trim_end_matches('/'))
}

/// Spawn `count` workers that drain the record channel through `job` and
/// feed a rendezvous result channel.
///
/// Workers exit when the record channel closes, when the result consumer
/// goes away, or after their current item once `cancel` fires. The result
/// channel closes once every worker is done.
pub(crate) fn run_workers<F>(
    count: usize,
    records: Receiver<PackageRecord>,
    cancel: &CancelFlag,
    job: F,
) -> (Receiver<TransferResult>, Vec<JoinHandle<()>>)
where
    F: Fn(usize, &PackageRecord) -> Result<u64> + Send + Sync + 'static,
{
    let records = Arc::new(Mutex::new(records));
    let job = Arc::new(job);
    let (result_tx, result_rx) = mpsc::sync_channel(0);

    let mut handles = Vec::with_capacity(count.max(1));
    for id in 1..=count.max(1) {
        let records = Arc::clone(&records);
        let job = Arc::clone(&job);
        let result_tx = result_tx.clone();
        let cancel = cancel.clone();
        handles.push(thread::spawn(move || loop {
            let received = {
                let Ok(guard) = records.lock() else { return };
                guard.recv()
            };
            let Ok(record) = received else { return };

            let result = match job(id, &record) {
                Ok(bytes) => TransferResult::success(record, id, bytes),
                Err(err) => TransferResult::failure(record, id, err),
            };
            if cancel.is_canceled() {
                debug!(worker = id, "canceled");
                return;
            }
            if result_tx.send(result).is_err() {
                return;
            }
        }));
    }
    (result_rx, handles)
}
