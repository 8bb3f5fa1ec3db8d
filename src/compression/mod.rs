// src/compression/mod.rs

//! Streaming decompression of repository index files
//!
//! Index files referenced by repomd.xml arrive as `.bz2`, `.gz` or `.xz`.
//! The content is streamed into a temp file so that multi-hundred-megabyte
//! primary databases never live in memory.

use crate::error::{Error, Result};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;
use xz2::read::XzDecoder;

/// Decompress `path` into a fresh temporary file, dispatching on the file
/// extension. The caller owns the returned handle; the file is removed when
/// the handle drops.
pub fn decompress(path: &Path) -> Result<NamedTempFile> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;

    let mut reader: Box<dyn Read> = match path.extension().and_then(OsStr::to_str) {
        Some("bz2") => Box::new(BzDecoder::new(file)),
        Some("gz") => Box::new(GzDecoder::new(file)),
        Some("xz") => Box::new(XzDecoder::new(file)),
        _ => return Err(Error::UnsupportedFormat(path.display().to_string())),
    };

    let mut tmp = NamedTempFile::new().map_err(|e| Error::io(path, e))?;
    let bytes = io::copy(&mut reader, &mut tmp).map_err(|e| Error::io(path, e))?;
    debug!(source = %path.display(), bytes, "decompressed index file");
    Ok(tmp)
}
