// src/repository/transport.rs

//! HTTP client construction
//!
//! Mirrors talk to upstreams that frequently sit behind client-certificate
//! TLS, private CAs or an outbound proxy. All of that is folded into one
//! `ClientConfig` that builds the shared blocking client. Gzip
//! auto-decompression is disabled so that `.gz` index files land on disk
//! byte-for-byte as served.

use crate::error::{Error, Result};
use reqwest::blocking::Client;
use reqwest::{Certificate, Identity, Proxy};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// TLS and proxy settings for a repository's HTTP client.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Skip TLS peer verification
    pub insecure: bool,
    /// PEM client certificate, presented together with `client_key`
    pub client_cert: Option<PathBuf>,
    /// PEM private key for `client_cert`
    pub client_key: Option<PathBuf>,
    /// Additional PEM CA certificates to trust
    pub ca_certs: Vec<PathBuf>,
}

impl ClientConfig {
    /// Build the blocking HTTP client for this configuration.
    ///
    /// The `http_proxy` environment variable, when set to something that
    /// parses as a URL, is used as the proxy for all outbound requests.
    pub fn build(&self) -> Result<Client> {
        debug!(
            insecure = self.insecure,
            cert = ?self.client_cert,
            key = ?self.client_key,
            cacerts = ?self.ca_certs,
            "configuring http transport"
        );

        let mut builder = Client::builder().no_gzip();

        if self.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let (Some(cert), Some(key)) = (&self.client_cert, &self.client_key) {
            let cert_pem = fs::read(cert).map_err(|e| Error::io(cert, e))?;
            let key_pem = fs::read(key).map_err(|e| Error::io(key, e))?;
            builder = builder.identity(Identity::from_pkcs8_pem(&cert_pem, &key_pem)?);
        }

        for ca in &self.ca_certs {
            let pem = fs::read(ca).map_err(|e| Error::io(ca, e))?;
            builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
        }

        if let Some(proxy) = proxy_from_env() {
            builder = builder.proxy(proxy);
        }

        Ok(builder.build()?)
    }
}

fn proxy_from_env() -> Option<Proxy> {
    let raw = env::var("http_proxy").ok()?;
    if raw.is_empty() {
        return None;
    }
    Proxy::all(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds() {
        ClientConfig::default().build().unwrap();
    }

    #[test]
    fn insecure_config_builds() {
        let config = ClientConfig {
            insecure: true,
            ..Default::default()
        };
        config.build().unwrap();
    }

    #[test]
    fn missing_certificate_file_is_an_io_error() {
        let config = ClientConfig {
            client_cert: Some(PathBuf::from("/does/not/exist.crt")),
            client_key: Some(PathBuf::from("/does/not/exist.key")),
            ..Default::default()
        };
        match config.build() {
            Err(Error::Io { path, .. }) => assert_eq!(path, PathBuf::from("/does/not/exist.crt")),
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn missing_ca_file_is_an_io_error() {
        let config = ClientConfig {
            ca_certs: vec![PathBuf::from("/does/not/exist.pem")],
            ..Default::default()
        };
        assert!(config.build().is_err());
    }
}
