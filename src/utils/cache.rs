use crate::utils::hashing::ContentHash;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sled::{Db, Tree};
use std::path::Path;
use std::sync::Arc;

/// Two-level build cache: a hot in-memory map backed by an optional
/// persistent sled store for cross-session reuse.
pub struct MusubiCache {
    transform_cache: Arc<DashMap<String, String>>,
    bundle_cache: Arc<DashMap<String, String>>,
    persistent: Option<Arc<PersistentCache>>,
}

/// Persistent cache using sled for cross-session performance
pub struct PersistentCache {
    _db: Db,
    transform_tree: Tree,
    bundle_tree: Tree,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub content_hash: ContentHash,
    pub result: String,
    pub file_size: u64,
}

impl PersistentCache {
    pub fn new(cache_dir: &Path) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        std::fs::create_dir_all(cache_dir)?;
        let db_path = cache_dir.join("musubi_cache.sled");

        let db = sled::open(db_path)?;
        let transform_tree = db.open_tree("transforms")?;
        let bundle_tree = db.open_tree("bundles")?;

        Ok(Self {
            _db: db,
            transform_tree,
            bundle_tree,
        })
    }

    pub fn get(&self, tree: CacheKind, key: &str) -> Option<CacheEntry> {
        self.tree(tree)
            .get(key)
            .ok()
            .flatten()
            .and_then(|bytes| bincode::deserialize(&bytes).ok())
    }

    pub fn set(
        &self,
        tree: CacheKind,
        key: &str,
        entry: &CacheEntry,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let bytes = bincode::serialize(entry)?;
        self.tree(tree).insert(key, bytes)?;
        self.tree(tree).flush()?;
        Ok(())
    }

    pub fn is_valid(&self, entry: &CacheEntry, current_hash: ContentHash, current_size: u64) -> bool {
        entry.content_hash == current_hash && entry.file_size == current_size
    }

    fn tree(&self, kind: CacheKind) -> &Tree {
        match kind {
            CacheKind::Transform => &self.transform_tree,
            CacheKind::Bundle => &self.bundle_tree,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Transform,
    Bundle,
}

impl MusubiCache {
    pub fn new() -> Self {
        Self {
            transform_cache: Arc::new(DashMap::new()),
            bundle_cache: Arc::new(DashMap::new()),
            persistent: None,
        }
    }

    /// Open the cache with a sled store under `cache_dir`. Falls back to a
    /// memory-only cache when the store cannot be opened (e.g. held by
    /// another process).
    pub fn with_persistent_cache(cache_dir: &Path) -> Self {
        let persistent = PersistentCache::new(cache_dir).ok().map(Arc::new);

        Self {
            transform_cache: Arc::new(DashMap::new()),
            bundle_cache: Arc::new(DashMap::new()),
            persistent,
        }
    }

    pub fn has_persistent_store(&self) -> bool {
        self.persistent.is_some()
    }

    /// Cache a transformed module keyed by path and content hash.
    pub fn cache_transform(&self, path: &str, content: &str, result: String) {
        self.store(CacheKind::Transform, path, content, result);
    }

    pub fn get_transform(&self, path: &str, content: &str) -> Option<String> {
        self.lookup(CacheKind::Transform, path, content)
    }

    /// Cache a finished bundle keyed by the graph fingerprint.
    pub fn cache_bundle(&self, fingerprint: &str, content: &str, result: String) {
        self.store(CacheKind::Bundle, fingerprint, content, result);
    }

    pub fn get_bundle(&self, fingerprint: &str, content: &str) -> Option<String> {
        self.lookup(CacheKind::Bundle, fingerprint, content)
    }

    fn store(&self, kind: CacheKind, path: &str, content: &str, result: String) {
        let content_hash = ContentHash::of_bytes(content.as_bytes());
        let key = format!("{}:{}", path, content_hash.to_hex());

        self.hot(kind).insert(key.clone(), result.clone());

        if let Some(ref persistent) = self.persistent {
            let entry = CacheEntry {
                content_hash,
                result,
                file_size: content.len() as u64,
            };
            let _ = persistent.set(kind, &key, &entry);
        }
    }

    fn lookup(&self, kind: CacheKind, path: &str, content: &str) -> Option<String> {
        let content_hash = ContentHash::of_bytes(content.as_bytes());
        let key = format!("{}:{}", path, content_hash.to_hex());

        if let Some(cached) = self.hot(kind).get(&key) {
            return Some(cached.clone());
        }

        if let Some(ref persistent) = self.persistent {
            if let Some(entry) = persistent.get(kind, &key) {
                if persistent.is_valid(&entry, content_hash, content.len() as u64) {
                    // Promote to the hot cache
                    self.hot(kind).insert(key, entry.result.clone());
                    return Some(entry.result);
                }
            }
        }

        None
    }

    fn hot(&self, kind: CacheKind) -> &DashMap<String, String> {
        match kind {
            CacheKind::Transform => &self.transform_cache,
            CacheKind::Bundle => &self.bundle_cache,
        }
    }

    pub fn clear(&self) {
        self.transform_cache.clear();
        self.bundle_cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            transform_entries: self.transform_cache.len(),
            bundle_entries: self.bundle_cache.len(),
            persistent: self.persistent.is_some(),
        }
    }
}

impl Default for MusubiCache {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub transform_entries: usize,
    pub bundle_entries: usize,
    pub persistent: bool,
}
