//! Content-addressed cache of extracted profiles.
//!
//! Keys are the SHA-256 hex digest of the raw (pre-decode) image bytes, so the
//! same file uploaded twice is only detected and binned once. Entries are never
//! evicted; a long-running process grows without bound (LRU/TTL not implemented).

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use crate::domain::{Disk, RadialProfile};

/// What a cache hit gives back: the geometry and the profile derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedProfile {
    pub disk: Disk,
    pub profile: RadialProfile,
}

#[derive(Debug, Default)]
pub struct ProfileCache {
    entries: RwLock<HashMap<String, Arc<CachedProfile>>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide instance, empty at startup.
    pub fn global() -> &'static ProfileCache {
        static GLOBAL: OnceLock<ProfileCache> = OnceLock::new();
        GLOBAL.get_or_init(ProfileCache::new)
    }

    /// SHA-256 hex digest of `bytes`.
    pub fn key_for(bytes: &[u8]) -> String {
        format!("{:x}", Sha256::digest(bytes))
    }

    pub fn get(&self, key: &str) -> Option<Arc<CachedProfile>> {
        self.entries.read().get(key).cloned()
    }

    /// Insert or overwrite. Concurrent writers of the same key are last-writer-wins.
    pub fn insert(&self, key: String, entry: CachedProfile) -> Arc<CachedProfile> {
        let entry = Arc::new(entry);
        self.entries.write().insert(key, Arc::clone(&entry));
        entry
    }

    /// Look up `key`, computing and storing the entry on a miss.
    ///
    /// The lock is not held while `compute` runs; two threads missing on the
    /// same key both compute and the later insert wins. Failed computations
    /// are not cached. The boolean is `true` on a hit.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &str,
        compute: impl FnOnce() -> Result<CachedProfile, E>,
    ) -> Result<(Arc<CachedProfile>, bool), E> {
        if let Some(hit) = self.get(key) {
            return Ok((hit, true));
        }
        let entry = compute()?;
        Ok((self.insert(key.to_string(), entry), false))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
