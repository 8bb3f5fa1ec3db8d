// src/util.rs

//! Small filesystem and log-formatting helpers

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Fixed-width log label: pad `s` with dots up to `max`, or cut it at `max`
/// bytes. Keeps the per-package log columns aligned.
pub fn ellipsis(s: &str, max: usize) -> String {
    if s.len() <= max {
        let mut out = String::with_capacity(max);
        out.push_str(s);
        for _ in s.len()..max {
            out.push('.');
        }
        return out;
    }
    String::from_utf8_lossy(&s.as_bytes()[..max]).into_owned()
}

/// Copy a single file, creating nothing; the caller prepares directories.
pub fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    let mut src = File::open(source).map_err(|e| Error::io(source, e))?;
    let mut dst = File::create(dest).map_err(|e| Error::io(dest, e))?;
    io::copy(&mut src, &mut dst).map_err(|e| Error::io(dest, e))?;
    Ok(())
}

/// Copy the directory `source` (the directory itself, not just its contents)
/// into `dest`, so `copy_dir("/a/repodata", "/b")` produces `/b/repodata/...`.
pub fn copy_dir(source: &Path, dest: &Path) -> Result<()> {
    let base = source.file_name().ok_or_else(|| {
        Error::PreconditionFailed(format!("{} has no directory name", source.display()))
    })?;
    let target_root = dest.join(base);

    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            match e.into_io_error() {
                Some(ioe) => Error::io(path, ioe),
                None => Error::io(path, io::Error::other("filesystem loop")),
            }
        })?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .expect("walkdir yields paths under its root");
        let target = target_root.join(rel);
        if entry.file_type().is_dir() {
            debug!(path = %target.display(), "creating directory");
            fs::create_dir_all(&target).map_err(|e| Error::io(&target, e))?;
        } else {
            debug!(source = %entry.path().display(), dest = %target.display(), "copy file");
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn ellipsis_pads_and_truncates() {
        assert_eq!(ellipsis("123456", 6), "123456");
        assert_eq!(ellipsis("123", 6), "123...");
        assert_eq!(ellipsis("1234567", 6), "123456");
        assert_eq!(ellipsis("1234567", 0), "");
        assert_eq!(ellipsis("", 3), "...");
    }

    #[test]
    fn copy_dir_copies_the_directory_itself() {
        let src_root = tempfile::tempdir().unwrap();
        let dst_root = tempfile::tempdir().unwrap();

        let data = src_root.path().join("repodata");
        fs::create_dir_all(data.join("sub")).unwrap();
        fs::write(data.join("repomd.xml"), b"<repomd/>").unwrap();
        fs::write(data.join("sub/file.bin"), b"payload").unwrap();

        copy_dir(&data, dst_root.path()).unwrap();

        let copied = dst_root.path().join("repodata");
        assert_eq!(fs::read(copied.join("repomd.xml")).unwrap(), b"<repomd/>");
        assert_eq!(fs::read(copied.join("sub/file.bin")).unwrap(), b"payload");
    }

    #[test]
    fn copy_dir_missing_source_is_an_error() {
        let dst_root = tempfile::tempdir().unwrap();
        let err = copy_dir(Path::new("/does/not/exist"), dst_root.path());
        assert!(err.is_err());
    }
}
