// src/lib.rs

//! rpmirror
//!
//! Mirrors remote RPM/YUM package repositories to a local filesystem tree
//! and produces snapshots (copies or symlink farms) of local mirrors.
//!
//! # Architecture
//!
//! - Metadata first: `repodata/` is refreshed through a staging directory
//!   and published with a single atomic rename, so consumers never observe
//!   a half-written index
//! - Lazy enumeration: the primary index (embedded SQLite or streaming XML)
//!   feeds packages through a rendezvous channel, never holding the catalog
//!   in memory
//! - Worker pool: downloads are concurrent, checksum-verified and
//!   resumable; packages that already verify locally are never re-fetched

pub mod checksum;
pub mod compression;
mod error;
pub mod package;
pub mod primary;
pub mod repofile;
pub mod repomd;
pub mod repository;
pub mod util;

pub use error::{Error, Result};
pub use package::{PackageRecord, TransferResult};
pub use primary::{enumerate, CancelFlag, PackageStream};
pub use repomd::{MetaFile, RepoIndex};
pub use repository::{ClientConfig, Repository, SnapshotOptions, SyncStats};
