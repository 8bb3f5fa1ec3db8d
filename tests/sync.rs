// tests/sync.rs

//! End-to-end sync tests against a constructed local repository.
//!
//! None of these touch the network: the cache check runs before any HTTP
//! request, and failure cases use URLs that fail before a connection is
//! attempted. Tests against a live mirror are `#[ignore]`d.

mod common;

use rpmirror::{CancelFlag, Error, Repository};
use std::fs;

const PACKAGES: &[(&str, &[u8])] = &[
    ("Packages/bash-4.2.46-31.el7.x86_64.rpm", b"bash payload"),
    ("Packages/zsh-5.0.2-34.el7.x86_64.rpm", b"zsh payload"),
    ("Packages/zsh-html-5.0.2-34.el7.x86_64.rpm", b"zsh html payload"),
];

#[test]
fn fully_cached_sync_transfers_nothing() {
    let fixture = common::build_repo(PACKAGES);
    let repo = Repository::new(&fixture.repo_path, "").unwrap();

    let stats = repo.sync("", 2, &CancelFlag::new()).unwrap();
    assert_eq!(stats.cached, 3);
    assert_eq!(stats.downloaded, 0);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.bytes, 0);
}

#[test]
fn syncing_twice_leaves_identical_state() {
    let fixture = common::build_repo(PACKAGES);
    let repo = Repository::new(&fixture.repo_path, "").unwrap();

    repo.sync("", 2, &CancelFlag::new()).unwrap();
    let before: Vec<Vec<u8>> = PACKAGES
        .iter()
        .map(|(rel, _)| common::read(&fixture.repo_path.join(rel)))
        .collect();

    let stats = repo.sync("", 2, &CancelFlag::new()).unwrap();
    assert_eq!(stats.bytes, 0);
    for ((rel, _), old) in PACKAGES.iter().zip(before) {
        assert_eq!(common::read(&fixture.repo_path.join(rel)), old);
    }
}

#[test]
fn filter_narrows_the_run() {
    let fixture = common::build_repo(PACKAGES);
    let repo = Repository::new(&fixture.repo_path, "").unwrap();

    let stats = repo.sync("zsh", 2, &CancelFlag::new()).unwrap();
    assert_eq!(stats.cached, 2);
    assert_eq!(stats.failed, 0);
}

#[test]
fn filter_matching_nothing_is_an_immediate_success() {
    let fixture = common::build_repo(PACKAGES);
    let repo = Repository::new(&fixture.repo_path, "").unwrap();

    let stats = repo.sync("no-such-package", 2, &CancelFlag::new()).unwrap();
    assert_eq!(stats.cached + stats.downloaded + stats.failed, 0);
    assert_eq!(stats.bytes, 0);
}

#[test]
fn empty_repository_is_an_immediate_success() {
    let fixture = common::build_repo(&[]);
    let repo = Repository::new(&fixture.repo_path, "").unwrap();

    let stats = repo.sync("", 4, &CancelFlag::new()).unwrap();
    assert_eq!(stats.cached + stats.downloaded + stats.failed, 0);
}

#[test]
fn missing_package_fails_without_aborting_the_run() {
    let fixture = common::build_repo(PACKAGES);
    // Drop one package from disk; with no usable upstream its re-fetch
    // fails, the others stay cached.
    fs::remove_file(fixture.repo_path.join("Packages/zsh-5.0.2-34.el7.x86_64.rpm")).unwrap();

    let repo = Repository::new(&fixture.repo_path, "").unwrap();
    let stats = repo.sync("", 2, &CancelFlag::new()).unwrap();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.cached, 2);
}

#[test]
fn sync_without_an_index_fails() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::new(dir.path(), "").unwrap();
    assert!(repo.sync("", 2, &CancelFlag::new()).is_err());
}

#[test]
fn failed_meta_sync_leaves_the_live_index_alone() {
    let fixture = common::build_repo(PACKAGES);
    let live_repomd = fixture.repo_path.join("repodata").join("repomd.xml");
    let before = common::read(&live_repomd);

    // Nothing listens on port 9; the fetch fails before anything is
    // published.
    let repo = Repository::new(&fixture.repo_path, "http://127.0.0.1:9").unwrap();
    match repo.sync_meta() {
        Err(Error::Network(_)) => {}
        other => panic!("expected Network, got {other:?}"),
    }

    assert_eq!(common::read(&live_repomd), before);
    // The staging directory is left behind for debugging, never published.
    assert!(fixture.repo_path.join(".newrepodata").exists());
}

#[test]
#[ignore = "requires network access to a live mirror"]
fn sync_from_a_live_mirror() {
    let dest = tempfile::tempdir().unwrap();
    let repo = Repository::new(
        dest.path().join("centos"),
        "http://vault.centos.org/7.9.2009/os/x86_64",
    )
    .unwrap();

    repo.sync_meta().unwrap();
    assert!(dest.path().join("centos/repodata/repomd.xml").is_file());
    assert!(!dest.path().join("centos/.newrepodata").exists());

    let stats = repo.sync("zsh", 2, &CancelFlag::new()).unwrap();
    assert!(stats.downloaded + stats.cached > 0);
}
