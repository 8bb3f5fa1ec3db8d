// src/commands/mod.rs

//! Command implementations for the rpmirror CLI
//!
//! Per-repository failures in the repo-file and snapshot commands are
//! counted and logged but do not abort the remaining work; the single-URL
//! command propagates its error so the process exits non-zero.

use anyhow::Result;
use rpmirror::repofile;
use rpmirror::{CancelFlag, ClientConfig, Repository, SnapshotOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

/// Options shared by the `url` command.
pub struct UrlOptions {
    pub filter: String,
    pub meta_only: bool,
    pub insecure: bool,
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
    pub cacerts: Vec<PathBuf>,
    pub workers: usize,
}

/// Mirror a single repository given its URL.
pub fn cmd_sync_url(url: &str, destination: &str, options: &UrlOptions) -> Result<()> {
    info!(
        url,
        destination,
        workers = options.workers,
        filter = %options.filter,
        insecure = options.insecure,
        "starting sync"
    );
    let config = ClientConfig {
        insecure: options.insecure,
        client_cert: options.cert.clone(),
        client_key: options.key.clone(),
        ca_certs: options.cacerts.clone(),
    };
    let repo = Repository::with_client(Path::new(destination), url, config.build()?);

    repo.sync_meta()?;
    if options.meta_only {
        return Ok(());
    }
    let stats = repo.sync(&options.filter, options.workers, &CancelFlag::new())?;
    info!(
        downloaded = stats.downloaded,
        cached = stats.cached,
        failed = stats.failed,
        bytes = stats.bytes,
        "sync finished"
    );
    Ok(())
}

/// Options for the repo-file command.
pub struct RepoFileOptions {
    pub filter: String,
    pub meta_only: bool,
    pub insecure: bool,
    pub release: String,
    pub basearch: String,
    /// Only sync the repository with this name
    pub repoid: Option<String>,
    /// Skip repositories whose name contains any of these substrings
    pub exclude: Vec<String>,
    /// Only sync repositories marked enabled=1
    pub enabled_only: bool,
    /// Mirror into this directory name instead of the section name
    pub rename: Option<String>,
    pub workers: usize,
}

/// Mirror every repository listed in a yum repo file.
pub fn cmd_sync_repofile(
    repofile_path: &Path,
    destination: &Path,
    options: &RepoFileOptions,
) -> Result<()> {
    let start = Instant::now();
    info!(repofile = %repofile_path.display(), "parsing repofile");
    let repos = repofile::load(
        repofile_path,
        destination,
        options.insecure,
        &options.release,
        &options.basearch,
    )?;

    let mut synced = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;
    for mut repo in repos {
        if let Some(repoid) = &options.repoid {
            if *repoid != repo.name {
                info!(name = %repo.name, reason = "repoid does not match", "skipping repository");
                skipped += 1;
                continue;
            }
        }
        if options.enabled_only && !repo.enabled {
            info!(name = %repo.name, reason = "not enabled", "skipping repository");
            skipped += 1;
            continue;
        }
        if options
            .exclude
            .iter()
            .any(|pattern| !pattern.is_empty() && repo.name.contains(pattern.as_str()))
        {
            info!(name = %repo.name, reason = "excluded", "skipping repository");
            skipped += 1;
            continue;
        }
        if let Some(name) = &options.rename {
            let mut renamed = Repository::with_client(
                destination.join(name),
                repo.remote_url(),
                repo.client().clone(),
            );
            renamed.name = name.clone();
            renamed.enabled = repo.enabled;
            repo = renamed;
        }

        info!(name = %repo.name, "metadata sync");
        if let Err(err) = repo.sync_meta() {
            error!(name = %repo.name, %err, "metadata sync failed");
            failed += 1;
            continue;
        }
        if options.meta_only {
            continue;
        }
        match repo.sync(&options.filter, options.workers, &CancelFlag::new()) {
            Ok(stats) => {
                synced += 1;
                info!(
                    name = %repo.name,
                    downloaded = stats.downloaded,
                    cached = stats.cached,
                    failed = stats.failed,
                    "repository synced"
                );
            }
            Err(err) => {
                error!(name = %repo.name, %err, "package sync failed");
                failed += 1;
            }
        }
    }
    info!(
        duration = ?start.elapsed(),
        synced,
        skipped,
        failed,
        "finished"
    );
    Ok(())
}

/// Snapshot one or more local repositories into a destination directory.
pub fn cmd_snapshot(
    destination: &Path,
    sources: &[String],
    link: bool,
    regenerate: bool,
    workers: usize,
) -> Result<()> {
    let start = Instant::now();
    let options = SnapshotOptions {
        link,
        regenerate,
        workers,
    };
    let mut failed = 0usize;
    for source in sources {
        let repo = Repository::new(Path::new(source), "")?;
        if let Err(err) = repo.snapshot(destination, &options, &CancelFlag::new()) {
            failed += 1;
            warn!(source, %err, "could not create snapshot");
        }
    }
    info!(
        duration = ?start.elapsed(),
        sources = sources.len(),
        failed,
        "finished"
    );
    Ok(())
}
