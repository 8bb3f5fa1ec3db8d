// src/repository/fetch.rs

//! Single-file HTTP fetch
//!
//! One GET, streamed straight to disk. The caching variant first checks
//! whether the destination already carries the expected checksum and skips
//! the network entirely when it does, which is what makes re-running a sync
//! cheap.

use crate::checksum;
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::debug;

/// Fetch `url` into `dest`, creating parent directories as needed.
///
/// Returns the number of bytes written. Any HTTP status >= 300 fails with
/// `HttpStatus`; the body is streamed, never buffered in memory.
pub fn fetch(client: &Client, url: &str, dest: &Path) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let mut out = File::create(dest).map_err(|e| Error::io(dest, e))?;

    let mut response = client.get(url).send()?;
    let status = response.status().as_u16();
    if status >= 300 {
        return Err(Error::HttpStatus {
            code: status,
            url: url.to_string(),
        });
    }

    let bytes = io::copy(&mut response, &mut out).map_err(|e| Error::io(dest, e))?;
    Ok(bytes)
}

/// Fetch `url` into `dest` unless the destination already verifies against
/// the expected checksum; verify after the transfer.
///
/// Returns 0 when the local file was reused, the transferred byte count
/// otherwise. An empty `checksum_type` disables verification (and with it
/// the cache check: the file is always re-fetched).
pub fn fetch_verified(
    client: &Client,
    url: &str,
    dest: &Path,
    checksum_type: &str,
    expected: &str,
) -> Result<u64> {
    debug!(
        url,
        dest = %dest.display(),
        sum_type = checksum_type,
        checksum = expected,
        "fetch"
    );
    if dest.exists() && !checksum_type.is_empty() && checksum::verify(dest, checksum_type, expected)
    {
        return Ok(0);
    }

    let bytes = fetch(client, url, dest)?;
    if checksum_type.is_empty() {
        return Ok(bytes);
    }
    let got = checksum::compute(dest, checksum_type).map_err(|e| Error::io(dest, e))?;
    if got != expected {
        return Err(Error::ChecksumMismatch {
            path: dest.to_path_buf(),
            expected: expected.to_string(),
            got,
        });
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest, Sha256};
    use std::fs;

    #[test]
    fn cached_file_skips_the_network() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("Packages/cached.rpm");
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(&dest, b"package payload").unwrap();
        let sum = format!("{:x}", Sha256::digest(b"package payload"));

        // The URL is unreachable on purpose; a cache hit must not touch it.
        let client = Client::new();
        let bytes = fetch_verified(
            &client,
            "http://203.0.113.1/never-contacted.rpm",
            &dest,
            "sha256",
            &sum,
        )
        .unwrap();
        assert_eq!(bytes, 0);
    }

    #[test]
    fn invalid_url_is_a_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let client = Client::new();
        match fetch(&client, "htp:/not a url", &dest) {
            Err(Error::Network(_)) => {}
            other => panic!("expected Network, got {other:?}"),
        }
    }
}
