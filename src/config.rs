//! Agent configuration
//!
//! The metadata endpoint can be configured from, in order of priority:
//! 1. Kernel command line (`firstboot.url=`, `firstboot.insecure=`)
//! 2. Command line arguments (`--metadata-url`, `--insecure`, ...)
//! 3. Environment variables (`FIRSTBOOT_METADATA_URL`, ...)
//! 4. Defaults

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use firstboot_metadata::{MetadataConfig, DEFAULT_BASE_URL};
use tracing::{info, warn};

const KERNEL_CMDLINE: &str = "/proc/cmdline";

/// Parameters parsed from the kernel command line
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KernelParams {
    /// Metadata base URL (firstboot.url=)
    pub url: Option<String>,
    /// Skip TLS verification (firstboot.insecure=)
    pub insecure: Option<bool>,
}

impl KernelParams {
    /// Parse firstboot parameters from /proc/cmdline
    pub fn from_cmdline() -> Self {
        match fs::read_to_string(KERNEL_CMDLINE) {
            Ok(content) => {
                let params = Self::parse(&content);
                if params != Self::default() {
                    info!("Parsed kernel parameters: url={:?}, insecure={:?}", params.url, params.insecure);
                }
                params
            }
            Err(e) => {
                warn!("Failed to read {}: {}", KERNEL_CMDLINE, e);
                Self::default()
            }
        }
    }

    pub fn parse(cmdline: &str) -> Self {
        let mut params = KernelParams::default();

        for param in cmdline.split_whitespace() {
            if let Some(value) = param.strip_prefix("firstboot.url=") {
                params.url = Some(value.to_string());
            } else if let Some(value) = param.strip_prefix("firstboot.insecure=") {
                params.insecure = Some(matches!(value, "1" | "true" | "yes"));
            } else if param == "firstboot.insecure" {
                params.insecure = Some(true);
            }
        }

        params
    }
}

/// Metadata endpoint arguments shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct MetadataArgs {
    /// Metadata service base URL
    #[arg(long, global = true, env = "FIRSTBOOT_METADATA_URL")]
    pub metadata_url: Option<String>,

    /// Accept invalid TLS certificates from the metadata service
    #[arg(long, global = true, env = "FIRSTBOOT_HTTPS_INSECURE")]
    pub insecure: bool,

    /// Additional PEM CA bundle to trust
    #[arg(long, global = true, env = "FIRSTBOOT_CA_BUNDLE")]
    pub ca_bundle: Option<PathBuf>,

    /// Retries after the first failed request
    #[arg(long, global = true, default_value_t = 5)]
    pub retry_count: u32,

    /// Seconds to wait between retries
    #[arg(long, global = true, default_value_t = 4)]
    pub retry_interval: u64,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    pub timeout: u64,
}

impl MetadataArgs {
    /// Merge arguments with kernel parameters into a store configuration
    pub fn to_config(&self, kernel: &KernelParams) -> MetadataConfig {
        let base_url = kernel
            .url
            .clone()
            .or_else(|| self.metadata_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        MetadataConfig {
            base_url,
            https_allow_insecure: kernel.insecure.unwrap_or(self.insecure),
            https_ca_bundle: self.ca_bundle.clone(),
            retry_count: self.retry_count,
            retry_interval: Duration::from_secs(self.retry_interval),
            request_timeout: Duration::from_secs(self.timeout),
        }
    }
}
