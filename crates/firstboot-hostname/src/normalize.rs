//! Hostname normalization
//!
//! Turns whatever hostname the metadata service proposed into one the
//! platform accepts, then applies it only when it differs from the
//! current name.
//!
//! Steps, in order:
//! 1. refuse outright on OS versions that forbid renaming during an
//!    unattended install
//! 2. keep only the first DNS label (`web-01.example.com` → `web-01`)
//! 3. truncate to 15 characters when NetBIOS compatibility is enabled
//! 4. replace one trailing `-` with `0`
//! 5. skip the change if the name already matches, ignoring case

use tracing::{debug, info, warn};

use crate::error::{HostnameError, Result};
use crate::platform::Platform;

/// Longest hostname NetBIOS accepts
pub const NETBIOS_HOST_NAME_MAX_LEN: usize = 15;

/// Rules applied to a proposed hostname
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostnamePolicy {
    pub max_length: usize,
    /// Truncate names longer than `max_length`; otherwise pass them through
    pub truncate: bool,
    /// OS versions at or above this refuse renames during unattended installs
    pub locked_from_version: (u32, u32),
}

impl Default for HostnamePolicy {
    fn default() -> Self {
        Self {
            max_length: NETBIOS_HOST_NAME_MAX_LEN,
            truncate: true,
            locked_from_version: (10, 0),
        }
    }
}

impl HostnamePolicy {
    pub fn with_truncation(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }
}

/// Outcome of [`HostnameNormalizer::set_hostname`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostnameChange {
    /// The normalized name, whether or not it had to be applied
    pub hostname: String,
    pub reboot_required: bool,
}

/// Applies [`HostnamePolicy`] and pushes the result to a [`Platform`]
#[derive(Debug, Clone, Default)]
pub struct HostnameNormalizer {
    policy: HostnamePolicy,
}

impl HostnameNormalizer {
    pub fn new(policy: HostnamePolicy) -> Self {
        Self { policy }
    }

    /// Apply the naming rules to `candidate` without touching the platform
    pub fn normalize(&self, candidate: &str) -> String {
        let mut hostname = candidate.split('.').next().unwrap_or_default().to_string();

        if self.policy.truncate && hostname.chars().count() > self.policy.max_length {
            let truncated: String = hostname.chars().take(self.policy.max_length).collect();
            warn!(
                old_hostname = %hostname,
                new_hostname = %truncated,
                "Truncating host name for NetBIOS compatibility"
            );
            hostname = truncated;
        }

        if let Some(stripped) = hostname.strip_suffix('-') {
            hostname = format!("{}0", stripped);
        }

        hostname
    }

    /// Normalize `candidate` and apply it
    ///
    /// Fails with [`HostnameError::PolicyViolation`] before looking at the
    /// candidate when the platform forbids the change. When the normalized
    /// name already matches the current one (ignoring case) the platform is
    /// left untouched and no reboot is required.
    pub fn set_hostname<P>(&self, platform: &P, candidate: &str) -> Result<HostnameChange>
    where
        P: Platform + ?Sized,
    {
        let (major, minor) = self.policy.locked_from_version;
        if platform.check_os_version(major, minor)? && platform.is_in_unattended_install()? {
            return Err(HostnameError::PolicyViolation(
                "the hostname can not be set in the unattended phase for this instance".to_string(),
            ));
        }

        let hostname = self.normalize(candidate);
        let current = platform.current_hostname()?;

        let reboot_required = if current.to_lowercase() == hostname.to_lowercase() {
            debug!(hostname = %hostname, "Hostname already set");
            false
        } else {
            info!(hostname = %hostname, previous = %current, "Setting hostname");
            platform.set_hostname(&hostname)?
        };

        Ok(HostnameChange {
            hostname,
            reboot_required,
        })
    }
}
