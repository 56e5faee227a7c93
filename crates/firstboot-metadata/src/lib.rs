//! Firstboot Metadata
//!
//! Reads instance metadata from a provider's metadata endpoint during the
//! first boot of a provisioned machine.
//!
//! # Overview
//!
//! The endpoint exposes two namespaces below a base URL:
//!
//! - `metadata` - JSON document with the instance id, hostname, SSH keys and
//!   provider specific data
//! - `userdata` - opaque payload supplied by whoever provisioned the machine
//!
//! [`MetadataStore::load`] fetches both once; the accessors then resolve
//! slash-separated paths against the stored documents.
//!
//! # Example
//!
//! ```no_run
//! use firstboot_metadata::{MetadataConfig, MetadataStore};
//!
//! # async fn run() -> firstboot_metadata::Result<()> {
//! let mut store = MetadataStore::from_config(&MetadataConfig::default())?;
//! if store.load().await {
//!     println!("hostname: {}", store.get_host_name()?);
//!     if let Some(keys) = store.get_public_keys()? {
//!         println!("{} ssh keys", keys.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Paths
//!
//! A path that ends on a list or object resolves to the number of its
//! children, not the children themselves:
//!
//! - `metadata/ssh_keys` - `Count(2)`
//! - `metadata/ssh_keys/0` - the first key

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod store;
pub mod transport;

pub use cache::ResolveCache;
pub use config::{MetadataConfig, DEFAULT_BASE_URL};
pub use document::{resolve, Node, Resolved, Scalar};
pub use error::{MetadataError, Result, TransportError};
pub use store::{MetadataStore, METADATA_NAMESPACE, USERDATA_NAMESPACE};
pub use transport::{with_retry, HttpTransport, RetryPolicy, Transport};
