// src/repository/sync.rs

//! Metadata refresh and the package download pipeline

use super::{fetch, fetch_verified, run_workers, Repository};
use crate::error::{Error, Result};
use crate::package::TransferResult;
use crate::primary::{self, CancelFlag};
use crate::repomd::RepoIndex;
use crate::util::ellipsis;
use rayon::prelude::*;
use std::fs;
use std::sync::mpsc::Receiver;
use tracing::{error, info, warn};

/// Counters for one `sync` run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    /// Packages fetched over the network
    pub downloaded: usize,
    /// Packages whose local copy already verified
    pub cached: usize,
    /// Packages that failed to download or verify
    pub failed: usize,
    /// Bytes actually transferred (0 for a fully cached run)
    pub bytes: u64,
}

impl Repository {
    /// Refresh the repository metadata atomically.
    ///
    /// Everything is downloaded into `.newrepodata/` first; the live
    /// `repodata/` is only replaced, by a single directory rename, once
    /// every listed file has arrived and verified. On failure the live
    /// index is untouched and partial staging files are left behind for
    /// the next run to overwrite.
    pub fn sync_meta(&self) -> Result<()> {
        let staged = self.local_path().join(".newrepodata").join("repomd.xml");
        fetch(
            self.client(),
            &self.remote_join("repodata/repomd.xml"),
            &staged,
        )?;
        let index = RepoIndex::load(&staged)?;
        info!(
            name = %self.name,
            files = index.files().len(),
            "fetching repository metadata"
        );

        let failure = index
            .files()
            .par_iter()
            .filter_map(|meta| {
                let url = self.remote_join(&meta.href);
                // repodata/<file> stages as .newrepodata/<file>
                let dest = self.local_path().join(format!(".new{}", meta.href));
                match fetch_verified(
                    self.client(),
                    &url,
                    &dest,
                    &meta.checksum_type,
                    &meta.checksum,
                ) {
                    Ok(_) => None,
                    Err(err) => {
                        warn!(file = %meta.href, %err, "metadata file download failed");
                        Some(err)
                    }
                }
            })
            .reduce_with(|first, _| first);
        if let Some(err) = failure {
            return Err(err);
        }

        let live = self.local_path().join("repodata");
        if live.exists() {
            fs::remove_dir_all(&live).map_err(|e| Error::io(&live, e))?;
        }
        let staging = self.local_path().join(".newrepodata");
        fs::rename(&staging, &live).map_err(|e| Error::io(&staging, e))?;
        info!(name = %self.name, "metadata published");
        Ok(())
    }

    /// Download every package the primary index lists (optionally filtered
    /// to paths containing `filter`) with a pool of `workers` threads.
    ///
    /// Individual package failures are logged and counted but do not abort
    /// the run; the enumerator's terminal error, if any, is returned after
    /// the result channel has drained.
    pub fn sync(&self, filter: &str, workers: usize, cancel: &CancelFlag) -> Result<SyncStats> {
        let index = self.index()?;
        let mut stream = primary::enumerate(self.local_path(), &index, filter, cancel.clone())?;
        info!(
            name = %self.name,
            total = stream.total,
            total_bytes = stream.total_bytes,
            "starting package sync"
        );
        if stream.is_empty() {
            return Ok(SyncStats::default());
        }

        let client = self.client().clone();
        let remote = self.remote_url().to_string();
        let local = self.local_path().to_path_buf();
        let (results, handles) = run_workers(
            workers,
            stream.take_receiver(),
            cancel,
            move |_, record| {
                let url = format!("{remote}/{}", record.rel_path);
                fetch_verified(
                    &client,
                    &url,
                    &local.join(&record.rel_path),
                    &record.checksum_type,
                    &record.checksum,
                )
            },
        );

        let stats = drain_results(results, stream.total_bytes);
        for handle in handles {
            let _ = handle.join();
        }
        stream.finish()?;
        Ok(stats)
    }
}

/// Drain the result channel, logging each package and accumulating the run
/// counters. Progress is a percentage of the promised archive bytes when
/// the index knew them, a raw byte count otherwise.
fn drain_results(results: Receiver<TransferResult>, total_bytes: u64) -> SyncStats {
    let mut stats = SyncStats::default();
    let mut progress_bytes = 0u64;

    for result in results {
        let label = ellipsis(result.record.file_name(), 40);
        match &result.error {
            Some(err) => {
                stats.failed += 1;
                error!(
                    status = result.status(),
                    worker = result.worker_id,
                    ordinal = result.record.ordinal,
                    %err,
                    "{label}"
                );
            }
            None => {
                progress_bytes += result.record.size;
                stats.bytes += result.bytes;
                if result.bytes == 0 {
                    stats.cached += 1;
                } else {
                    stats.downloaded += 1;
                }
                let progress = if total_bytes > 0 {
                    format!("{:.2}%", progress_bytes as f64 * 100.0 / total_bytes as f64)
                } else {
                    format!("{progress_bytes} bytes")
                };
                info!(
                    status = result.status(),
                    worker = result.worker_id,
                    ordinal = result.record.ordinal,
                    bytes = result.bytes,
                    progress = %progress,
                    "{label}"
                );
            }
        }
    }
    stats
}
