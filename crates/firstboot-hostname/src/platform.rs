//! Platform adapter
//!
//! The normalizer only needs four things from the operating system: its
//! version, whether an unattended install is running, the current hostname
//! and a way to change it. [`Platform`] is that seam; [`LinuxPlatform`] is
//! the implementation used on provisioned Linux machines.

use std::fs;
use std::path::{Path, PathBuf};

use nix::sys::utsname::uname;
use nix::unistd::{gethostname, sethostname};
use tracing::{debug, info};

use crate::error::{HostnameError, Result};

/// Default location of the persistent hostname
pub const HOSTNAME_FILE: &str = "/etc/hostname";

/// Marker present while an unattended install owns the machine
pub const UNATTENDED_MARKER: &str = "/run/firstboot/unattended";

/// Operating system operations needed to apply a hostname
pub trait Platform {
    /// True when the running OS version is at least `major.minor`
    fn check_os_version(&self, major: u32, minor: u32) -> Result<bool>;

    /// True while the machine is in an unattended installation phase
    fn is_in_unattended_install(&self) -> Result<bool>;

    /// Hostname the OS currently reports
    fn current_hostname(&self) -> Result<String>;

    /// Change the hostname, returning whether a reboot is needed for it to
    /// take effect
    fn set_hostname(&self, hostname: &str) -> Result<bool>;
}

/// Linux implementation of [`Platform`]
#[derive(Debug, Clone)]
pub struct LinuxPlatform {
    hostname_file: PathBuf,
    unattended_marker: PathBuf,
}

impl Default for LinuxPlatform {
    fn default() -> Self {
        Self::new(HOSTNAME_FILE, UNATTENDED_MARKER)
    }
}

impl LinuxPlatform {
    pub fn new(hostname_file: impl Into<PathBuf>, unattended_marker: impl Into<PathBuf>) -> Self {
        Self {
            hostname_file: hostname_file.into(),
            unattended_marker: unattended_marker.into(),
        }
    }
}

impl Platform for LinuxPlatform {
    fn check_os_version(&self, major: u32, minor: u32) -> Result<bool> {
        let uts = uname()?;
        let release = uts.release().to_string_lossy();
        let version = parse_release(&release);
        debug!(release = %release, ?version, "Kernel release");
        Ok(version.map_or(false, |v| v >= (major, minor)))
    }

    fn is_in_unattended_install(&self) -> Result<bool> {
        Ok(self.unattended_marker.exists())
    }

    fn current_hostname(&self) -> Result<String> {
        gethostname()?
            .into_string()
            .map_err(|_| HostnameError::InvalidEncoding)
    }

    fn set_hostname(&self, hostname: &str) -> Result<bool> {
        sethostname(hostname)?;
        write_hostname_file(&self.hostname_file, hostname)?;
        info!(hostname = %hostname, file = %self.hostname_file.display(), "Hostname updated");
        // The kernel picks the new name up immediately.
        Ok(false)
    }
}

/// Persist `hostname` so it survives a reboot
pub fn write_hostname_file(path: &Path, hostname: &str) -> Result<()> {
    fs::write(path, format!("{}\n", hostname)).map_err(|source| HostnameError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Extract `(major, minor)` from a kernel release such as `6.8.0-45-generic`
pub fn parse_release(release: &str) -> Option<(u32, u32)> {
    let mut parts = release.split(|c: char| !c.is_ascii_digit());
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    Some((major, minor))
}
