//! Apply command
//!
//! The first-boot path: load metadata, then apply the hostname. A missing
//! or broken metadata service never fails the boot; it only means nothing
//! gets configured.

use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::Result;
use firstboot_hostname::{HostnameNormalizer, HostnamePolicy, LinuxPlatform, Platform};
use firstboot_metadata::{MetadataConfig, MetadataError, MetadataStore, Transport};
use tracing::{error, info, warn};

#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    /// Do not truncate hostnames to the 15 character NetBIOS limit
    #[arg(long)]
    pub no_netbios_compat: bool,

    /// File the hostname is persisted to
    #[arg(long, default_value = firstboot_hostname::platform::HOSTNAME_FILE)]
    pub hostname_file: PathBuf,

    /// Marker file present while an unattended install is running
    #[arg(long, default_value = firstboot_hostname::platform::UNATTENDED_MARKER)]
    pub unattended_marker: PathBuf,
}

impl Default for ApplyArgs {
    fn default() -> Self {
        Self {
            no_netbios_compat: false,
            hostname_file: PathBuf::from(firstboot_hostname::platform::HOSTNAME_FILE),
            unattended_marker: PathBuf::from(firstboot_hostname::platform::UNATTENDED_MARKER),
        }
    }
}

/// What `apply` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Metadata could not be loaded; nothing was changed
    MetadataUnavailable,
    /// Metadata loaded but carried no usable hostname
    NoHostname,
    /// Hostname processed
    Hostname { hostname: String, reboot_required: bool },
}

pub async fn run_apply(args: &ApplyArgs, config: &MetadataConfig) -> Result<()> {
    let mut store = match MetadataStore::from_config(config) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Could not set up metadata transport, leaving instance unconfigured");
            println!("Metadata unavailable, no settings applied");
            return Ok(());
        }
    };
    let platform = LinuxPlatform::new(&args.hostname_file, &args.unattended_marker);
    let policy = HostnamePolicy::default().with_truncation(!args.no_netbios_compat);

    let outcome = apply(&mut store, &platform, &HostnameNormalizer::new(policy)).await?;

    match outcome {
        ApplyOutcome::MetadataUnavailable => {
            println!("Metadata unavailable, no settings applied");
        }
        ApplyOutcome::NoHostname => {
            println!("No hostname provided by metadata");
        }
        ApplyOutcome::Hostname {
            hostname,
            reboot_required,
        } => {
            println!("Hostname: {}", hostname);
            println!("Reboot required: {}", if reboot_required { "yes" } else { "no" });
        }
    }

    Ok(())
}

/// Load `store` and apply its hostname through `platform`
pub async fn apply<T, P>(
    store: &mut MetadataStore<T>,
    platform: &P,
    normalizer: &HostnameNormalizer,
) -> Result<ApplyOutcome>
where
    T: Transport,
    P: Platform + ?Sized,
{
    if !store.load().await {
        error!(base_url = %store.base_url(), "Could not load metadata, leaving instance unconfigured");
        return Ok(ApplyOutcome::MetadataUnavailable);
    }

    match store.get_instance_id() {
        Ok(id) => info!(instance_id = %id, "Instance identified"),
        Err(e) => warn!(error = %e, "No instance id in metadata"),
    }

    let candidate = match store.get_host_name() {
        Ok(hostname) => hostname,
        Err(MetadataError::NotFound(_)) => {
            info!("Metadata does not provide a hostname, skipping");
            return Ok(ApplyOutcome::NoHostname);
        }
        Err(e) => {
            warn!(error = %e, "Ignoring unusable hostname in metadata");
            return Ok(ApplyOutcome::NoHostname);
        }
    };

    if normalizer.normalize(&candidate).is_empty() {
        warn!(hostname = %candidate, "Hostname from metadata is empty once normalized, skipping");
        return Ok(ApplyOutcome::NoHostname);
    }

    let change = normalizer.set_hostname(platform, &candidate)?;
    if change.reboot_required {
        info!(hostname = %change.hostname, "Hostname set, reboot required");
    }

    Ok(ApplyOutcome::Hostname {
        hostname: change.hostname,
        reboot_required: change.reboot_required,
    })
}
