// src/error.rs

//! Crate-wide error type
//!
//! Per-package failures travel through the result channel and are reported
//! individually; everything else propagates as `Error` through the usual
//! `Result` plumbing. The library never exits the process.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while mirroring or snapshotting a repository
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport failure (connect, TLS, proxy, read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("http status {code} from {url}")]
    HttpStatus { code: u16, url: String },

    /// Local filesystem failure, annotated with the path involved
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File extension is none of `.bz2`, `.gz`, `.xz`
    #[error("{0} has an unsupported file extension, expected .bz2, .gz or .xz")]
    UnsupportedFormat(String),

    /// A repository index (repomd.xml, primary db or primary xml) was unreadable
    #[error("could not read {context}: {message}")]
    IndexParse { context: String, message: String },

    /// repomd.xml lists neither a `primary_db` nor a `primary` entry
    #[error("no primary db sqlite or xml entry found in repomd.xml")]
    NoPrimary,

    /// Downloaded or copied file does not match the checksum the index promised
    #[error("checksum mismatch for {}: expected {expected}, got {got}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        got: String,
    },

    /// The cancellation signal fired while the pipeline was running
    #[error("operation canceled")]
    Canceled,

    /// An operation refused to start because its preconditions do not hold
    #[error("{0}")]
    PreconditionFailed(String),

    /// createrepo exited non-zero; carries its combined output
    #[error("createrepo failed: {output}")]
    ExternalTool { output: String },
}

impl Error {
    /// Annotate an I/O error with the path it happened on.
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap an index-reader failure with the index it came from.
    pub(crate) fn index_parse(context: &str, message: impl ToString) -> Self {
        Self::IndexParse {
            context: context.to_string(),
            message: message.to_string(),
        }
    }
}
