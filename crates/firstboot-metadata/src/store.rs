//! Metadata store
//!
//! Holds the raw documents fetched from the metadata endpoint, one per
//! namespace, and exposes typed accessors over them.
//!
//! The endpoint serves two namespaces:
//! - `metadata`: a JSON object with `id`, `hostname`, `ssh_keys`, ...
//! - `userdata`: an opaque payload handed to the instance as-is
//!
//! Paths passed to the accessors are rooted at the namespace, e.g.
//! `metadata/ssh_keys/0`.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};
use url::Url;

use crate::cache::ResolveCache;
use crate::config::MetadataConfig;
use crate::document::{resolve, Node, Resolved, Scalar};
use crate::error::{MetadataError, Result};
use crate::transport::{HttpTransport, Transport};

/// Namespace holding the JSON instance metadata
pub const METADATA_NAMESPACE: &str = "metadata";

/// Namespace holding the raw user-data
pub const USERDATA_NAMESPACE: &str = "userdata";

const INSTANCE_ID_PATH: &str = "metadata/id";
const HOSTNAME_PATH: &str = "metadata/hostname";
const SSH_KEYS_PATH: &str = "metadata/ssh_keys";

#[derive(Debug)]
enum State {
    Unloaded,
    Loaded(Node),
}

/// Store for one instance's metadata
#[derive(Debug)]
pub struct MetadataStore<T> {
    base_url: Url,
    transport: T,
    state: State,
    cache: ResolveCache,
}

impl MetadataStore<HttpTransport> {
    /// Build a store talking HTTP(S) to the endpoint described by `config`
    pub fn from_config(config: &MetadataConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(config.base_url()?, transport))
    }
}

impl<T: Transport> MetadataStore<T> {
    /// Create an unloaded store; `base_url` should end with `/`
    pub fn new(base_url: Url, transport: T) -> Self {
        Self {
            base_url,
            transport,
            state: State::Unloaded,
            cache: ResolveCache::new(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, State::Loaded(_))
    }

    /// Fetch and parse both namespaces
    ///
    /// Returns `false` when either fetch fails or the metadata payload is
    /// not valid JSON; the failure is logged and any previously loaded
    /// data is kept. On success all previous data and cached lookups are
    /// replaced.
    pub async fn load(&mut self) -> bool {
        match self.fetch_documents().await {
            Ok(root) => {
                self.state = State::Loaded(root);
                self.cache.clear();
                info!(base_url = %self.base_url, "Loaded instance metadata");
                true
            }
            Err(MetadataError::Parse(e)) => {
                warn!(error = %e, "Failed to load metadata");
                false
            }
            Err(e) => {
                warn!(base_url = %self.base_url, error = %e, "Metadata service unavailable");
                false
            }
        }
    }

    async fn fetch_documents(&self) -> Result<Node> {
        let mut payloads = Vec::with_capacity(2);
        for namespace in [METADATA_NAMESPACE, USERDATA_NAMESPACE] {
            let url = self.base_url.join(namespace)?;
            let payload = self.transport.fetch_with_retry(&url).await.map_err(|e| {
                debug!(namespace, url = %url, error = %e, "Namespace not found");
                e
            })?;
            payloads.push((namespace, payload));
        }

        let mut root = BTreeMap::new();
        for (namespace, payload) in payloads {
            let node = if namespace == METADATA_NAMESPACE {
                Node::from_json_slice(&payload)?
            } else {
                Node::bytes(payload)
            };
            root.insert(namespace.to_string(), node);
        }
        Ok(Node::Mapping(root))
    }

    /// Resolve `path` through the cache
    ///
    /// With `decode` set, a bytes leaf comes back as text. Like
    /// [`resolve`], a path ending on a list or object yields its length
    /// rather than its contents.
    pub fn get(&self, path: &str, decode: bool) -> Result<Resolved> {
        let root = match &self.state {
            State::Loaded(root) => root,
            State::Unloaded => return Err(MetadataError::NotFound(path.to_string())),
        };
        self.cache.get_or_resolve(path, decode, || resolve(root, path))
    }

    fn get_text(&self, path: &str) -> Result<String> {
        match self.get(path, true)? {
            Resolved::Scalar(Scalar::Null) => Err(MetadataError::NotFound(path.to_string())),
            Resolved::Scalar(scalar) => Ok(scalar.to_string()),
            Resolved::Count(_) => Err(MetadataError::UnexpectedType {
                path: path.to_string(),
                expected: "a single value",
            }),
        }
    }

    /// Unique identifier of this instance at the provider
    pub fn get_instance_id(&self) -> Result<String> {
        self.get_text(INSTANCE_ID_PATH)
    }

    /// Hostname the provider assigned to this instance
    pub fn get_host_name(&self) -> Result<String> {
        self.get_text(HOSTNAME_PATH)
    }

    /// Raw user-data payload
    pub fn get_user_data(&self) -> Result<Vec<u8>> {
        match self.get(USERDATA_NAMESPACE, false)? {
            Resolved::Scalar(Scalar::Bytes(bytes)) => Ok(bytes),
            Resolved::Scalar(Scalar::Null) => {
                Err(MetadataError::NotFound(USERDATA_NAMESPACE.to_string()))
            }
            Resolved::Scalar(other) => Ok(other.to_string().into_bytes()),
            Resolved::Count(_) => Err(MetadataError::UnexpectedType {
                path: USERDATA_NAMESPACE.to_string(),
                expected: "a raw payload",
            }),
        }
    }

    /// SSH public keys in index order
    ///
    /// `None` means no keys are present, whether `ssh_keys` is missing or
    /// empty. Entries that are null or not text are skipped with a warning,
    /// so a present list is never empty.
    pub fn get_public_keys(&self) -> Result<Option<Vec<String>>> {
        let count = match self.get(SSH_KEYS_PATH, false) {
            Ok(Resolved::Count(count)) => count,
            Ok(Resolved::Scalar(_)) => {
                return Err(MetadataError::UnexpectedType {
                    path: SSH_KEYS_PATH.to_string(),
                    expected: "a list",
                })
            }
            Err(MetadataError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let mut keys = Vec::with_capacity(count);
        for index in 0..count {
            match self.get_text(&format!("{}/{}", SSH_KEYS_PATH, index)) {
                Ok(key) => keys.push(key),
                Err(e) => warn!(index, error = %e, "Skipping unusable ssh key"),
            }
        }

        Ok(if keys.is_empty() { None } else { Some(keys) })
    }
}
