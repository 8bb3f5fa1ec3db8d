// src/repomd.rs

//! repomd.xml parsing
//!
//! `repomd.xml` is the root manifest of a repository: an ordered list of
//! index files (`primary_db`, `filelists`, `group`, ...), each with a
//! location, checksum and size. It is the only file fetched without
//! checksum verification, since it is itself the root of trust.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One `<data>` entry of repomd.xml.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaFile {
    /// Basename of `href`
    pub name: String,
    /// Logical type: `primary`, `primary_db`, `filelists`, `group`, ...
    pub kind: String,
    /// Digest algorithm label (`sha256`, or `sha` for legacy SHA-1)
    pub checksum_type: String,
    /// Hex digest of the file as stored on the server
    pub checksum: String,
    /// Size in bytes as stored on the server
    pub size: u64,
    /// Location relative to the repository root, e.g. `repodata/<hash>-primary.sqlite.bz2`
    pub href: String,
}

/// The parsed repomd.xml index, entries in document order.
#[derive(Debug, Clone, Default)]
pub struct RepoIndex {
    files: Vec<MetaFile>,
}

impl RepoIndex {
    /// Parse repomd.xml from a file on disk.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Self::from_reader(file)
    }

    /// Parse repomd.xml from any reader.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let doc: RepomdDoc = serde_xml_rs::from_reader(reader)
            .map_err(|e| Error::index_parse("repomd.xml", e))?;

        let mut files = Vec::with_capacity(doc.data.len());
        for entry in doc.data {
            let href = entry.location.href;
            if href.is_empty()
                || href.starts_with('/')
                || href.split('/').any(|part| part == "..")
            {
                return Err(Error::index_parse(
                    "repomd.xml",
                    format!("location href {href:?} escapes the repository"),
                ));
            }
            let name = href.rsplit('/').next().unwrap_or(&href).to_string();
            files.push(MetaFile {
                name,
                kind: entry.kind,
                checksum_type: entry.checksum.kind,
                checksum: entry.checksum.value,
                size: entry.size,
                href,
            });
        }
        Ok(Self { files })
    }

    /// First entry of the given logical type, if any.
    pub fn get(&self, kind: &str) -> Option<&MetaFile> {
        self.files.iter().find(|m| m.kind == kind)
    }

    /// All entries, in document order.
    pub fn files(&self) -> &[MetaFile] {
        &self.files
    }
}

// Wire shape of repomd.xml; only what the mirror needs is decoded.
#[derive(Debug, Deserialize)]
struct RepomdDoc {
    #[serde(rename = "data", default)]
    data: Vec<DataEntry>,
}

#[derive(Debug, Deserialize)]
struct DataEntry {
    #[serde(rename = "type")]
    kind: String,
    location: LocationElem,
    checksum: ChecksumElem,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct LocationElem {
    href: String,
}

#[derive(Debug, Deserialize)]
struct ChecksumElem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "$value")]
    value: String,
}
