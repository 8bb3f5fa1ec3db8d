// tests/common/mod.rs

//! Shared test fixtures: builds a complete local repository on disk with a
//! gzip-compressed SQLite primary index, a matching repomd.xml and dummy
//! package files.

use flate2::write::GzEncoder;
use flate2::Compression;
use rusqlite::{params, Connection};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct FixtureRepo {
    /// Keep alive; dropping removes the whole tree
    pub root: TempDir,
    /// The repository directory under `root`
    pub repo_path: PathBuf,
}

/// Build a local repository named `repo` containing the given
/// `(relative path, payload)` packages, both in the index and on disk.
pub fn build_repo(packages: &[(&str, &[u8])]) -> FixtureRepo {
    build_repo_with_files(packages, true)
}

/// Same as `build_repo`, optionally leaving the package files off disk so
/// sync has something to (fail to) fetch.
pub fn build_repo_with_files(packages: &[(&str, &[u8])], with_files: bool) -> FixtureRepo {
    let root = tempfile::tempdir().unwrap();
    let repo_path = root.path().join("repo");
    fs::create_dir_all(repo_path.join("repodata")).unwrap();

    let db = tempfile::NamedTempFile::new().unwrap();
    let conn = Connection::open(db.path()).unwrap();
    conn.execute_batch(
        "CREATE TABLE packages (
            pkgKey INTEGER PRIMARY KEY,
            location_href TEXT,
            size_archive INTEGER,
            checksum_type TEXT,
            pkgId TEXT
        )",
    )
    .unwrap();
    for (rel_path, payload) in packages {
        let checksum = sha256_hex(payload);
        conn.execute(
            "INSERT INTO packages (location_href, size_archive, checksum_type, pkgId)
             VALUES (?1, ?2, ?3, ?4)",
            params![rel_path, payload.len() as i64, "sha256", checksum],
        )
        .unwrap();

        if with_files {
            let dest = repo_path.join(rel_path);
            fs::create_dir_all(dest.parent().unwrap()).unwrap();
            fs::write(&dest, payload).unwrap();
        }
    }
    drop(conn);

    let gz_path = repo_path.join("repodata").join("primary.sqlite.gz");
    let mut encoder = GzEncoder::new(File::create(&gz_path).unwrap(), Compression::default());
    encoder.write_all(&fs::read(db.path()).unwrap()).unwrap();
    encoder.finish().unwrap();

    let gz_bytes = fs::read(&gz_path).unwrap();
    let repomd = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<repomd xmlns="http://linux.duke.edu/metadata/repo">
  <revision>1</revision>
  <data type="primary_db">
    <checksum type="sha256">{checksum}</checksum>
    <location href="repodata/primary.sqlite.gz"/>
    <size>{size}</size>
  </data>
</repomd>
"#,
        checksum = sha256_hex(&gz_bytes),
        size = gz_bytes.len(),
    );
    fs::write(repo_path.join("repodata").join("repomd.xml"), repomd).unwrap();

    FixtureRepo { root, repo_path }
}

pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Read a file, panicking with its path on failure.
pub fn read(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}
