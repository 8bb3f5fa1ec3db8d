// src/repofile.rs

//! yum repo-file parsing
//!
//! A `.repo` file is an INI-like list of repository sections:
//!
//! ```text
//! [updates]
//! name=Updates for $releasever
//! baseurl=http://mirror.example.com/$releasever/os/$basearch
//! enabled=1
//! sslclientcert=/etc/pki/tls/client.crt
//! ```
//!
//! Each section with at least one key becomes a `Repository` rooted at
//! `<dest>/<section-name>`, with `$releasever` and `$basearch` substituted
//! into the base URL and the TLS keys feeding the HTTP transport.

use crate::error::{Error, Result};
use crate::repository::{ClientConfig, Repository};
use std::fs;
use std::path::{Path, PathBuf};

/// Parse `path` into one repository per populated section.
pub fn load(
    path: &Path,
    dest: &Path,
    insecure: bool,
    release: &str,
    basearch: &str,
) -> Result<Vec<Repository>> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse(&text, dest, insecure, release, basearch)
}

fn parse(
    text: &str,
    dest: &Path,
    insecure: bool,
    release: &str,
    basearch: &str,
) -> Result<Vec<Repository>> {
    let mut repos = Vec::new();
    for section in sections(text) {
        if section.keys.is_empty() {
            continue;
        }
        let baseurl = section.get("baseurl").ok_or_else(|| {
            Error::PreconditionFailed(format!("repository [{}] has no baseurl", section.name))
        })?;
        let url = baseurl
            .replace("$basearch", basearch)
            .replace("$releasever", release);

        let config = ClientConfig {
            insecure,
            client_cert: section.get("sslclientcert").map(PathBuf::from),
            client_key: section.get("sslclientkey").map(PathBuf::from),
            ca_certs: section
                .get("sslcacert")
                .map(PathBuf::from)
                .into_iter()
                .collect(),
        };

        let mut repo = Repository::with_client(dest.join(&section.name), &url, config.build()?);
        repo.enabled = section.get("enabled") == Some("1");
        repo.name = section.name;
        repos.push(repo);
    }
    Ok(repos)
}

struct Section {
    name: String,
    keys: Vec<(String, String)>,
}

impl Section {
    fn get(&self, key: &str) -> Option<&str> {
        self.keys
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn sections(text: &str) -> Vec<Section> {
    let mut out: Vec<Section> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            out.push(Section {
                name: name.to_string(),
                keys: Vec::new(),
            });
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            if let Some(section) = out.last_mut() {
                section
                    .keys
                    .push((key.trim().to_string(), value.trim().to_string()));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEDORA_REPO: &str = r#"
# Fedora server repository
[fedora]
name=Fedora $releasever - $basearch
baseurl=http://ftp.linux.cz/pub/linux/fedora/linux/releases/$releasever/Server/$basearch/os
enabled=1
gpgcheck=0
"#;

    #[test]
    fn substitutes_release_and_arch() {
        let dest = tempfile::tempdir().unwrap();
        let repos = parse(FEDORA_REPO, dest.path(), false, "22", "x86_64").unwrap();
        assert_eq!(repos.len(), 1);

        let repo = &repos[0];
        assert_eq!(
            repo.remote_url(),
            "http://ftp.linux.cz/pub/linux/fedora/linux/releases/22/Server/x86_64/os"
        );
        assert_eq!(repo.name, "fedora");
        assert!(repo.enabled);
        assert_eq!(repo.local_path(), dest.path().join("fedora"));
    }

    #[test]
    fn one_repository_per_populated_section() {
        let text = r#"
[main]

[base]
baseurl=http://mirror/base
enabled=0

[updates]
baseurl=http://mirror/updates
enabled=1
"#;
        let dest = tempfile::tempdir().unwrap();
        let repos = parse(text, dest.path(), false, "7", "x86_64").unwrap();
        let names: Vec<&str> = repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["base", "updates"]);
        assert!(!repos[0].enabled);
        assert!(repos[1].enabled);
    }

    #[test]
    fn missing_baseurl_is_an_error() {
        let text = "[broken]\nenabled=1\n";
        let dest = tempfile::tempdir().unwrap();
        match parse(text, dest.path(), false, "7", "x86_64") {
            Err(Error::PreconditionFailed(reason)) => {
                assert!(reason.contains("broken"), "unexpected reason: {reason}")
            }
            other => panic!("expected PreconditionFailed, got {other:?}"),
        }
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let text = "# comment\n; other comment\n\n[r]\nbaseurl=http://m/os\n";
        let dest = tempfile::tempdir().unwrap();
        let repos = parse(text, dest.path(), false, "7", "x86_64").unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].remote_url(), "http://m/os");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dest = tempfile::tempdir().unwrap();
        match load(Path::new("/does/not/exist.repo"), dest.path(), false, "7", "x86_64") {
            Err(Error::Io { .. }) => {}
            other => panic!("expected Io, got {other:?}"),
        }
    }
}
