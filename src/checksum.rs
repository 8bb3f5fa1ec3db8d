// src/checksum.rs

//! File checksum computation and verification
//!
//! Repository indexes label digests either `sha256` or, on legacy
//! repositories, `sha` (meaning SHA-1). Anything that is not explicitly
//! `sha256` is therefore computed as SHA-1.

use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Compute the hex-lowercase digest of a file.
///
/// `kind` selects the algorithm: `"sha256"` for SHA-256, anything else for
/// SHA-1.
pub fn compute(path: &Path, kind: &str) -> io::Result<String> {
    let mut file = File::open(path)?;
    match kind {
        "sha256" => digest_hex::<Sha256>(&mut file),
        _ => digest_hex::<Sha1>(&mut file),
    }
}

fn digest_hex<D: Digest + io::Write>(reader: &mut impl Read) -> io::Result<String>
where
    D::OutputSize: std::ops::Add<D::OutputSize>,
    <D::OutputSize as std::ops::Add<D::OutputSize>>::Output: sha2::digest::generic_array::ArrayLength<u8>,
{
    let mut hasher = D::new();
    io::copy(reader, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Check a file against an expected hex digest.
///
/// An empty `kind` skips verification and reports success; an unreadable
/// file reports failure rather than an error.
pub fn verify(path: &Path, kind: &str, expected: &str) -> bool {
    if !path.is_file() {
        return false;
    }
    if kind.is_empty() {
        return true;
    }
    match compute(path, kind) {
        Ok(got) => got == expected,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &[u8]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn sha256_digest() {
        let f = write_temp(b"hello");
        assert_eq!(
            compute(f.path(), "sha256").unwrap(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn anything_else_falls_back_to_sha1() {
        let f = write_temp(b"hello");
        let sha1_hex = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";
        assert_eq!(compute(f.path(), "sha").unwrap(), sha1_hex);
        assert_eq!(compute(f.path(), "sha1").unwrap(), sha1_hex);
        assert_eq!(compute(f.path(), "").unwrap(), sha1_hex);
    }

    #[test]
    fn verify_matches_and_mismatches() {
        let f = write_temp(b"hello");
        assert!(verify(
            f.path(),
            "sha256",
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        ));
        assert!(!verify(f.path(), "sha256", "deadbeef"));
    }

    #[test]
    fn empty_kind_skips_verification() {
        let f = write_temp(b"anything");
        assert!(verify(f.path(), "", "not-a-checksum"));
    }

    #[test]
    fn unreadable_file_fails_verification() {
        let path = Path::new("/does/not/exist");
        assert!(!verify(path, "sha256", "2cf24d"));
        assert!(!verify(path, "", ""));
    }
}
