// src/package.rs

//! Package records and per-package transfer results

use crate::error::{Error, Result};

/// One package as listed by the primary index.
///
/// Immutable once constructed; the relative path has been checked to stay
/// inside the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    /// Path relative to the repository root, e.g. `Packages/zsh-5.0.2.rpm`
    pub rel_path: String,
    /// Digest algorithm label (`sha256`, or `sha` for legacy SHA-1); may be empty
    pub checksum_type: String,
    /// Hex digest of the package file
    pub checksum: String,
    /// Archive size in bytes
    pub size: u64,
    /// 1-based position in the enumeration, used to correlate log lines
    pub ordinal: u64,
}

impl PackageRecord {
    pub fn new(
        rel_path: String,
        checksum: String,
        checksum_type: String,
        size: u64,
        ordinal: u64,
    ) -> Result<Self> {
        if rel_path.is_empty()
            || rel_path.starts_with('/')
            || rel_path.split('/').any(|part| part == "..")
        {
            return Err(Error::index_parse(
                "primary index",
                format!("package location {rel_path:?} escapes the repository"),
            ));
        }
        Ok(Self {
            rel_path,
            checksum_type,
            checksum,
            size,
            ordinal,
        })
    }

    /// Basename of the relative path, for log labels.
    pub fn file_name(&self) -> &str {
        self.rel_path.rsplit('/').next().unwrap_or(&self.rel_path)
    }
}

/// Outcome of one package operation (download, copy or link).
#[derive(Debug)]
pub struct TransferResult {
    pub record: PackageRecord,
    pub worker_id: usize,
    /// Bytes actually moved over the wire; 0 when the local copy was reused
    pub bytes: u64,
    pub error: Option<Error>,
}

impl TransferResult {
    pub fn success(record: PackageRecord, worker_id: usize, bytes: u64) -> Self {
        Self {
            record,
            worker_id,
            bytes,
            error: None,
        }
    }

    pub fn failure(record: PackageRecord, worker_id: usize, error: Error) -> Self {
        Self {
            record,
            worker_id,
            bytes: 0,
            error: Some(error),
        }
    }

    /// Status label for log output.
    pub fn status(&self) -> &'static str {
        if self.error.is_some() {
            "failed"
        } else if self.bytes == 0 {
            "cached"
        } else {
            "downld"
        }
    }
}
