// src/primary.rs

//! Lazy package enumeration from the primary index
//!
//! The primary index comes in two shapes: a compressed SQLite database
//! (`primary_db`) or a compressed XML document (`primary`). Both are turned
//! into the same thing here: a producer thread feeding `PackageRecord`s
//! through a rendezvous channel, with a terminal error retrievable once the
//! channel has been drained. Consumers cannot tell the two paths apart.
//!
//! The channel has no buffer, so however many workers consume it is exactly
//! how many records are ever in flight.

use crate::compression;
use crate::error::{Error, Result};
use crate::package::PackageRecord;
use crate::repomd::{MetaFile, RepoIndex};
use rusqlite::{params_from_iter, Connection};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tempfile::NamedTempFile;
use tracing::debug;
use xml::reader::{EventReader, XmlEvent};

/// Broadcast cancellation signal shared by the enumerator and the workers.
///
/// Once set it never resets; every channel interaction in the pipeline
/// observes it and winds down after the current item.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A running package enumeration: the record channel plus the totals known
/// up front (SQLite path only; the XML path reports 0 for both).
pub struct PackageStream {
    /// Number of records the index promises, 0 when unknown
    pub total: u64,
    /// Sum of archive sizes the index promises, 0 when unknown
    pub total_bytes: u64,
    receiver: Option<Receiver<PackageRecord>>,
    producer: Option<JoinHandle<Result<()>>>,
}

impl std::fmt::Debug for PackageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageStream")
            .field("total", &self.total)
            .field("total_bytes", &self.total_bytes)
            .finish()
    }
}

impl PackageStream {
    /// True when the enumerator determined up front that nothing matches;
    /// the channel is already closed and no producer is running.
    pub fn is_empty(&self) -> bool {
        self.producer.is_none()
    }

    /// Hand the record channel to the consumer side. Called once.
    pub fn take_receiver(&mut self) -> Receiver<PackageRecord> {
        self.receiver.take().expect("package receiver already taken")
    }

    /// Wait for the producer and report its terminal error. Call after the
    /// channel has been drained (or dropped), otherwise this deadlocks on
    /// the rendezvous send.
    pub fn finish(self) -> Result<()> {
        match self.producer {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(Error::index_parse("primary index", "enumerator panicked"))),
            None => Ok(()),
        }
    }
}

/// Start enumerating packages for the given index.
///
/// Prefers the SQLite index, falls back to the XML index, and fails with
/// `NoPrimary` when the repomd lists neither. `filter` is a plain substring
/// match on the package path; empty matches everything.
pub fn enumerate(
    repo_root: &Path,
    index: &RepoIndex,
    filter: &str,
    cancel: CancelFlag,
) -> Result<PackageStream> {
    if let Some(meta) = index.get("primary_db") {
        return from_sqlite(repo_root, meta, filter, cancel);
    }
    if let Some(meta) = index.get("primary") {
        return from_xml(repo_root, meta, filter, cancel);
    }
    Err(Error::NoPrimary)
}

/// `count(*)` over the packages table with the same filter the enumeration
/// applies.
pub fn count_packages(db: &Path, filter: &str) -> Result<u64> {
    scalar(db, "count(*)", filter).map(|v| v.max(0) as u64)
}

/// `sum(size_archive)` over the packages table with the same filter the
/// enumeration applies.
pub fn total_archive_bytes(db: &Path, filter: &str) -> Result<u64> {
    scalar(db, "sum(size_archive)", filter).map(|v| v.max(0) as u64)
}

fn scalar(db: &Path, aggregate: &str, filter: &str) -> Result<i64> {
    let conn = open_db(db)?;
    let (sql, pattern) = filtered_query(&format!("SELECT {aggregate} FROM packages"), filter);
    conn.query_row(&sql, params_from_iter(pattern.iter()), |row| {
        row.get::<_, Option<i64>>(0)
    })
    .map(|v| v.unwrap_or(0))
    .map_err(|e| Error::index_parse("primary db", e))
}

// The filter is bound as a parameter; only the static query skeleton is
// assembled by string concatenation.
fn filtered_query(base: &str, filter: &str) -> (String, Option<String>) {
    if filter.is_empty() {
        (base.to_string(), None)
    } else {
        (
            format!("{base} WHERE location_href LIKE ?1"),
            Some(format!("%{filter}%")),
        )
    }
}

fn open_db(path: &Path) -> Result<Connection> {
    Connection::open(path).map_err(|e| Error::index_parse("primary db", e))
}

fn from_sqlite(
    repo_root: &Path,
    meta: &MetaFile,
    filter: &str,
    cancel: CancelFlag,
) -> Result<PackageStream> {
    let tmp = compression::decompress(&repo_root.join("repodata").join(&meta.name))?;

    let total = count_packages(tmp.path(), filter)?;
    let (tx, rx) = mpsc::sync_channel(0);
    if total == 0 {
        debug!(filter, "primary db matches no packages");
        return Ok(PackageStream {
            total: 0,
            total_bytes: 0,
            receiver: Some(rx),
            producer: None,
        });
    }
    let total_bytes = total_archive_bytes(tmp.path(), filter)?;

    let filter = filter.to_string();
    let producer = thread::spawn(move || sqlite_producer(tmp, &filter, tx, cancel));
    Ok(PackageStream {
        total,
        total_bytes,
        receiver: Some(rx),
        producer: Some(producer),
    })
}

fn sqlite_producer(
    tmp: NamedTempFile,
    filter: &str,
    tx: SyncSender<PackageRecord>,
    cancel: CancelFlag,
) -> Result<()> {
    let conn = open_db(tmp.path())?;
    let (sql, pattern) = filtered_query(
        "SELECT location_href, size_archive, checksum_type, pkgId FROM packages",
        filter,
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| Error::index_parse("primary db", e))?;
    let mut rows = stmt
        .query(params_from_iter(pattern.iter()))
        .map_err(|e| Error::index_parse("primary db", e))?;

    let mut ordinal = 0u64;
    loop {
        let row = match rows.next().map_err(|e| Error::index_parse("primary db", e))? {
            Some(row) => row,
            None => break,
        };
        let rel_path: String = row.get(0).map_err(|e| Error::index_parse("primary db", e))?;
        let size: Option<i64> = row.get(1).map_err(|e| Error::index_parse("primary db", e))?;
        let checksum_type: Option<String> =
            row.get(2).map_err(|e| Error::index_parse("primary db", e))?;
        let checksum: Option<String> =
            row.get(3).map_err(|e| Error::index_parse("primary db", e))?;

        ordinal += 1;
        let record = PackageRecord::new(
            rel_path,
            checksum.unwrap_or_default(),
            checksum_type.unwrap_or_default(),
            size.unwrap_or(0).max(0) as u64,
            ordinal,
        )?;
        send(&tx, &cancel, record)?;
    }
    Ok(())
}

fn from_xml(
    repo_root: &Path,
    meta: &MetaFile,
    filter: &str,
    cancel: CancelFlag,
) -> Result<PackageStream> {
    let tmp = compression::decompress(&repo_root.join("repodata").join(&meta.name))?;

    let (tx, rx) = mpsc::sync_channel(0);
    let filter = filter.to_string();
    let producer = thread::spawn(move || xml_producer(tmp, &filter, tx, cancel));
    Ok(PackageStream {
        total: 0,
        total_bytes: 0,
        receiver: Some(rx),
        producer: Some(producer),
    })
}

fn xml_producer(
    tmp: NamedTempFile,
    filter: &str,
    tx: SyncSender<PackageRecord>,
    cancel: CancelFlag,
) -> Result<()> {
    let file = File::open(tmp.path()).map_err(|e| Error::io(tmp.path(), e))?;
    let mut parser = EventReader::new(BufReader::new(file));

    let mut ordinal = 0u64;
    loop {
        match next_event(&mut parser)? {
            XmlEvent::StartElement { name, .. } if name.local_name == "package" => {
                let (href, checksum_type, checksum, size) = read_package(&mut parser)?;
                if !filter.is_empty() && !href.contains(filter) {
                    continue;
                }
                ordinal += 1;
                let record = PackageRecord::new(href, checksum, checksum_type, size, ordinal)?;
                send(&tx, &cancel, record)?;
            }
            XmlEvent::EndDocument => break,
            _ => {}
        }
    }
    Ok(())
}

/// Consume everything up to the matching `</package>`, picking out the
/// location href, checksum and archive size from the direct children.
fn read_package<R: std::io::Read>(parser: &mut EventReader<R>) -> Result<(String, String, String, u64)> {
    let mut depth = 1usize;
    let mut href = String::new();
    let mut checksum_type = String::new();
    let mut checksum = String::new();
    let mut size = 0u64;
    let mut in_checksum = false;

    while depth > 0 {
        match next_event(parser)? {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                if depth == 1 {
                    match name.local_name.as_str() {
                        "location" => {
                            if let Some(v) = attr(&attributes, "href") {
                                href = v;
                            }
                        }
                        "checksum" => {
                            checksum_type = attr(&attributes, "type").unwrap_or_default();
                            in_checksum = true;
                        }
                        "size" => {
                            size = attr(&attributes, "archive")
                                .and_then(|v| v.parse().ok())
                                .unwrap_or(0);
                        }
                        _ => {}
                    }
                }
                depth += 1;
            }
            XmlEvent::EndElement { .. } => {
                depth -= 1;
                in_checksum = false;
            }
            XmlEvent::Characters(text) if in_checksum => checksum.push_str(text.trim()),
            XmlEvent::EndDocument => {
                return Err(Error::index_parse(
                    "primary.xml",
                    "document ended inside a <package> element",
                ));
            }
            _ => {}
        }
    }
    Ok((href, checksum_type, checksum, size))
}

fn next_event<R: std::io::Read>(parser: &mut EventReader<R>) -> Result<XmlEvent> {
    parser
        .next()
        .map_err(|e| Error::index_parse("primary.xml", e))
}

fn attr(attributes: &[xml::attribute::OwnedAttribute], name: &str) -> Option<String> {
    attributes
        .iter()
        .find(|a| a.name.local_name == name)
        .map(|a| a.value.clone())
}

fn send(tx: &SyncSender<PackageRecord>, cancel: &CancelFlag, record: PackageRecord) -> Result<()> {
    if cancel.is_canceled() {
        return Err(Error::Canceled);
    }
    // A closed channel means every consumer is gone, which only happens on
    // teardown; treat it like a cancellation.
    tx.send(record).map_err(|_| Error::Canceled)
}
