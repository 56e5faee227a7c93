//! Metadata endpoint configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::Result;

/// Default metadata endpoint
pub const DEFAULT_BASE_URL: &str = "https://metadata.packet.net/";

/// Connection settings for the metadata endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Base URL; namespaces (`metadata`, `userdata`) are joined onto it
    pub base_url: String,

    /// Skip TLS certificate verification
    pub https_allow_insecure: bool,

    /// Extra PEM root certificate to trust
    pub https_ca_bundle: Option<PathBuf>,

    /// Retries after the first failed attempt
    pub retry_count: u32,

    /// Pause between attempts
    #[serde(deserialize_with = "secs")]
    pub retry_interval: Duration,

    /// Per-request timeout
    #[serde(deserialize_with = "secs")]
    pub request_timeout: Duration,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            https_allow_insecure: false,
            https_ca_bundle: None,
            retry_count: 5,
            retry_interval: Duration::from_secs(4),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl MetadataConfig {
    /// Parse the base URL, making sure it ends with `/`
    ///
    /// `Url::join` replaces the last path segment unless the base is a
    /// directory, so `http://host/v1` must become `http://host/v1/`.
    pub fn base_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}

fn secs<'de, D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}
