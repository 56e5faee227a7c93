//! Fetching raw payloads from the metadata endpoint
//!
//! [`Transport`] is the seam the store talks to; [`HttpTransport`] is the
//! reqwest implementation used at boot. Retries live here, not in the store.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Certificate, Client};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::MetadataConfig;
use crate::error::TransportError;

/// Source of raw namespace payloads
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url`, retrying according to the transport's own policy
    async fn fetch_with_retry(&self, url: &Url) -> Result<Vec<u8>, TransportError>;
}

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl From<&MetadataConfig> for RetryPolicy {
    fn from(config: &MetadataConfig) -> Self {
        Self {
            retries: config.retry_count,
            interval: config.retry_interval,
        }
    }
}

/// Run `op` until it succeeds or the policy runs out of attempts
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    target: &str,
    mut op: F,
) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let attempts = policy.attempts();
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(url = %target, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt >= attempts => {
                return Err(TransportError::RetriesExhausted {
                    target: target.to_string(),
                    attempts,
                    last: Box::new(e),
                });
            }
            Err(e) => {
                warn!(
                    url = %target,
                    error = %e,
                    attempt,
                    max = attempts,
                    "Metadata request failed, retrying"
                );
                if !policy.interval.is_zero() {
                    tokio::time::sleep(policy.interval).await;
                }
                attempt += 1;
            }
        }
    }
}

/// HTTP(S) transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    policy: RetryPolicy,
}

impl HttpTransport {
    /// Build a client honoring the TLS and timeout settings in `config`
    pub fn new(config: &MetadataConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder().timeout(config.request_timeout);

        if config.https_allow_insecure {
            warn!("TLS certificate verification disabled for metadata requests");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(path) = &config.https_ca_bundle {
            let pem = std::fs::read(path).map_err(|source| TransportError::CaBundle {
                path: path.display().to_string(),
                source,
            })?;
            builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
            info!(path = %path.display(), "Trusting additional CA bundle");
        }

        Ok(Self {
            client: builder.build()?,
            policy: RetryPolicy::from(config),
        })
    }

    async fn fetch_once(&self, url: &Url) -> Result<Vec<u8>, TransportError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_with_retry(&self, url: &Url) -> Result<Vec<u8>, TransportError> {
        debug!(url = %url, "Fetching metadata");
        with_retry(self.policy, url.as_str(), move || self.fetch_once(url)).await
    }
}
