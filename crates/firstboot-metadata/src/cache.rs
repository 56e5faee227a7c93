//! Memoization of resolved metadata paths
//!
//! Accessors are called repeatedly during boot (the hostname is read by
//! several plugins, the key list resolves one path per key). The cache
//! keys on the exact path string and the decode flag and only remembers
//! successful lookups. The owning store clears it whenever the underlying
//! document is replaced.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::document::Resolved;
use crate::error::Result;

/// Per-store cache of resolved paths
#[derive(Debug, Default)]
pub struct ResolveCache {
    entries: RefCell<HashMap<(String, bool), Resolved>>,
}

impl ResolveCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `(path, decode)` or compute and store it
    ///
    /// Errors from `resolve` are returned as-is and not cached.
    pub fn get_or_resolve<F>(&self, path: &str, decode: bool, resolve: F) -> Result<Resolved>
    where
        F: FnOnce() -> Result<Resolved>,
    {
        let key = (path.to_string(), decode);
        if let Some(hit) = self.entries.borrow().get(&key) {
            return Ok(hit.clone());
        }

        let value = resolve()?;
        let value = if decode { value.decode() } else { value };
        self.entries.borrow_mut().insert(key, value.clone());
        Ok(value)
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Scalar;
    use crate::error::MetadataError;
    use std::cell::Cell;

    #[test]
    fn test_cache_hit_skips_resolver() {
        let cache = ResolveCache::new();
        let calls = Cell::new(0);
        let resolve = || {
            calls.set(calls.get() + 1);
            Ok(Resolved::Count(2))
        };

        assert_eq!(cache.get_or_resolve("metadata/ssh_keys", false, resolve).unwrap(), Resolved::Count(2));
        assert_eq!(cache.get_or_resolve("metadata/ssh_keys", false, resolve).unwrap(), Resolved::Count(2));
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.entries.borrow().len(), 1);
    }

    #[test]
    fn test_cache_keys_on_decode_flag() {
        let cache = ResolveCache::new();
        let raw = || Ok(Resolved::Scalar(Scalar::Bytes(b"data".to_vec())));

        let undecoded = cache.get_or_resolve("userdata", false, raw).unwrap();
        let decoded = cache.get_or_resolve("userdata", true, raw).unwrap();

        assert_eq!(undecoded, Resolved::Scalar(Scalar::Bytes(b"data".to_vec())));
        assert_eq!(decoded, Resolved::Scalar(Scalar::Text("data".to_string())));
        assert_eq!(cache.entries.borrow().len(), 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = ResolveCache::new();
        let result = cache.get_or_resolve("metadata/id", true, || {
            Err(MetadataError::NotFound("metadata/id".to_string()))
        });
        assert!(result.is_err());
        assert!(cache.entries.borrow().is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = ResolveCache::new();
        cache
            .get_or_resolve("metadata/id", true, || Ok(Resolved::Count(0)))
            .unwrap();
        cache.clear();
        assert!(cache.entries.borrow().is_empty());
    }
}
