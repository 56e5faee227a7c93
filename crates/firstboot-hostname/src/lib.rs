//! Firstboot Hostname
//!
//! Normalizes a proposed hostname to the platform's naming rules and
//! applies it.
//!
//! ```
//! use firstboot_hostname::{HostnameNormalizer, HostnamePolicy};
//!
//! let normalizer = HostnameNormalizer::new(HostnamePolicy::default());
//! assert_eq!(normalizer.normalize("My-Host.example.com"), "My-Host");
//! assert_eq!(normalizer.normalize("extremely-long-hostname-example"), "extremely-long0");
//! ```

pub mod error;
pub mod normalize;
pub mod platform;

pub use error::{HostnameError, Result};
pub use normalize::{HostnameChange, HostnameNormalizer, HostnamePolicy, NETBIOS_HOST_NAME_MAX_LEN};
pub use platform::{LinuxPlatform, Platform};
