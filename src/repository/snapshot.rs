// src/repository/snapshot.rs

//! Snapshots of a local mirror
//!
//! A snapshot walks the package list of a local repository and either
//! copies every package (verifying the copy) or plants absolute symlinks.
//! The index is then carried over verbatim, or regenerated with the
//! external `createrepo` tool.

use super::{run_workers, Repository};
use crate::checksum;
use crate::error::{Error, Result};
use crate::package::PackageRecord;
use crate::primary::{self, CancelFlag};
use crate::repomd::RepoIndex;
use crate::util::{self, ellipsis};
use std::fs;
use std::path::{self, Path, PathBuf};
use std::process::Command;
use tracing::{debug, error, info, warn};

/// Knobs for one snapshot run.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotOptions {
    /// Plant absolute symlinks instead of copying packages
    pub link: bool,
    /// Regenerate the index with `createrepo` instead of copying `repodata/`
    pub regenerate: bool,
    /// Worker thread count
    pub workers: usize,
}

impl Repository {
    /// Snapshot this repository into `<dest_root>/<basename(local)>`.
    ///
    /// Fails with `PreconditionFailed`, before touching the filesystem,
    /// when the source has no published index or the destination already
    /// exists. Per-package failures are logged and counted but do not stop
    /// the run.
    pub fn snapshot(
        &self,
        dest_root: &Path,
        options: &SnapshotOptions,
        cancel: &CancelFlag,
    ) -> Result<()> {
        let repomd = self.local_path().join("repodata").join("repomd.xml");
        if !repomd.is_file() {
            return Err(Error::PreconditionFailed(format!(
                "{} is not a valid repository, repodata/repomd.xml does not exist",
                self.local_path().display()
            )));
        }
        let base = self.local_path().file_name().ok_or_else(|| {
            Error::PreconditionFailed(format!(
                "{} has no directory name",
                self.local_path().display()
            ))
        })?;
        let destination = dest_root.join(base);
        if destination.exists() {
            return Err(Error::PreconditionFailed(format!(
                "destination {} already exists",
                destination.display()
            )));
        }
        // An index-only repository places no packages, so nothing below is
        // guaranteed to create the destination; createrepo needs it to exist.
        fs::create_dir_all(&destination).map_err(|e| Error::io(&destination, e))?;

        let index = self.index()?;
        let mut stream = primary::enumerate(self.local_path(), &index, "", cancel.clone())?;
        let mode = if options.link { "link" } else { "copy" };
        info!(
            name = %self.name,
            src = %self.local_path().display(),
            dest = %destination.display(),
            mode,
            "creating snapshot"
        );

        if !stream.is_empty() {
            let local = self.local_path().to_path_buf();
            let dest_dir = destination.clone();
            let link = options.link;
            let (results, handles) = run_workers(
                options.workers,
                stream.take_receiver(),
                cancel,
                move |_, record| copy_or_link(&local, &dest_dir, record, link).map(|_| 0),
            );

            let mut failed = 0usize;
            for result in results {
                let label = ellipsis(result.record.file_name(), 40);
                match &result.error {
                    Some(err) => {
                        failed += 1;
                        error!(status = result.status(), worker = result.worker_id, %err, "{label}");
                    }
                    None => info!(mode, worker = result.worker_id, "{label}"),
                }
            }
            if failed > 0 {
                warn!(failed, "snapshot finished with failed packages");
            }
            for handle in handles {
                let _ = handle.join();
            }
        }
        stream.finish()?;

        if !options.regenerate {
            return util::copy_dir(&self.local_path().join("repodata"), &destination);
        }
        self.regenerate_index(&index, &destination)
    }

    /// Run `createrepo -d [-g <groupfile>] <destination>` and report its
    /// combined output on failure.
    fn regenerate_index(&self, index: &RepoIndex, destination: &Path) -> Result<()> {
        let mut command = Command::new("createrepo");
        command.arg("-d");
        if let Some(group) = index.get("group") {
            command.arg("-g").arg(self.local_path().join(&group.href));
        }
        command.arg(destination);

        let output = command
            .output()
            .map_err(|e| Error::io(PathBuf::from("createrepo"), e))?;
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        debug!(status = %output.status, out = %combined, "ran createrepo");
        if !output.status.success() {
            return Err(Error::ExternalTool { output: combined });
        }
        Ok(())
    }
}

/// Place one package in the snapshot: an absolute symlink, or a copy
/// verified against the index checksum.
fn copy_or_link(local: &Path, dest_dir: &Path, record: &PackageRecord, link: bool) -> Result<()> {
    let source = local.join(&record.rel_path);
    let dest = dest_dir.join(&record.rel_path);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    if link {
        let absolute = path::absolute(&source).map_err(|e| Error::io(&source, e))?;
        debug!(source = %absolute.display(), dest = %dest.display(), "link package");
        return std::os::unix::fs::symlink(&absolute, &dest).map_err(|e| Error::io(&dest, e));
    }

    debug!(source = %source.display(), dest = %dest.display(), "copy package");
    util::copy_file(&source, &dest)?;
    if record.checksum_type.is_empty() {
        return Ok(());
    }
    let got = checksum::compute(&dest, &record.checksum_type).map_err(|e| Error::io(&dest, e))?;
    if got != record.checksum {
        return Err(Error::ChecksumMismatch {
            path: dest,
            expected: record.checksum.clone(),
            got,
        });
    }
    Ok(())
}
