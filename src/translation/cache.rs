/*!
 * Translation caching functionality.
 *
 * This module provides the two cache tiers consulted before any provider
 * call: an in-memory map that lives for one run, and an optional persistent
 * store shared across runs. Persistent failures are logged and treated as
 * misses; they never fail a run.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use log::{debug, warn};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tokio::task::JoinSet;

use crate::errors::CacheError;

/// Content-addressed key of the persistent tier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Source language code (or `auto`)
    pub source_language: String,

    /// Target language code
    pub target_language: String,

    /// SHA-256 hex digest of the sanitized source text
    pub content_hash: String,
}

impl CacheKey {
    /// Create a key for a sanitized text
    pub fn new(source_language: &str, target_language: &str, cleaned_text: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            content_hash: hash_text(cleaned_text),
        }
    }
}

/// Hash text for content-addressed storage
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Cross-run store of translated text
///
/// Implementations own their concurrency safety; the cache store may call
/// them from many units at once.
#[async_trait]
pub trait PersistentCache: Send + Sync {
    /// Point lookup
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError>;

    /// Insert or replace; at most one entry per key
    async fn set(&self, key: &CacheKey, translated: &str) -> Result<(), CacheError>;
}

/// Memory tier key: the full sanitized text, not its hash
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoryKey {
    source_language: String,
    target_language: String,
    cleaned_text: String,
}

/// A memory slot. Units asking for the same key share the cell, so at most
/// one of them performs the translation while the others wait.
pub type MemorySlot = Arc<OnceCell<String>>;

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// Translation found in either tier
    Hit(String),
    /// Not cached anywhere
    Miss,
}

impl LookupOutcome {
    /// The cached text, if any
    pub fn into_hit(self) -> Option<String> {
        match self {
            Self::Hit(text) => Some(text),
            Self::Miss => None,
        }
    }
}

/// Two-tier translation cache used by one run
pub struct CacheStore {
    /// Per-run memory tier
    memory: Mutex<HashMap<MemoryKey, MemorySlot>>,

    /// Cross-run tier, absent when persistent caching is disabled
    persistent: Option<Arc<dyn PersistentCache>>,

    /// Writes to the persistent tier not yet confirmed
    pending_writes: Mutex<JoinSet<()>>,

    /// Cache hit counter
    hits: AtomicUsize,

    /// Cache miss counter
    misses: AtomicUsize,
}

impl CacheStore {
    /// Create a cache with only the memory tier
    pub fn memory_only() -> Self {
        Self::build(None)
    }

    /// Create a cache backed by a persistent store
    pub fn with_persistent(store: Arc<dyn PersistentCache>) -> Self {
        Self::build(Some(store))
    }

    fn build(persistent: Option<Arc<dyn PersistentCache>>) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            persistent,
            pending_writes: Mutex::new(JoinSet::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Whether the persistent tier is active
    pub fn has_persistent(&self) -> bool {
        self.persistent.is_some()
    }

    /// Get (or create) the memory slot for a key
    pub fn memory_slot(&self, source_language: &str, target_language: &str, cleaned_text: &str) -> MemorySlot {
        let key = MemoryKey {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            cleaned_text: cleaned_text.to_string(),
        };
        self.memory.lock().entry(key).or_default().clone()
    }

    /// Look a text up in the memory tier, then the persistent tier.
    ///
    /// A persistent hit is promoted into the memory tier.
    pub async fn lookup(&self, source_language: &str, target_language: &str, cleaned_text: &str) -> LookupOutcome {
        let slot = self.memory_slot(source_language, target_language, cleaned_text);
        if let Some(hit) = slot.get() {
            self.record_hit();
            return LookupOutcome::Hit(hit.clone());
        }

        match self.get_persistent(source_language, target_language, cleaned_text).await {
            Some(hit) => {
                let _ = slot.set(hit.clone());
                self.record_hit();
                LookupOutcome::Hit(hit)
            }
            None => {
                self.record_miss();
                LookupOutcome::Miss
            }
        }
    }

    /// Read the persistent tier only. Errors are logged and count as a miss.
    pub async fn get_persistent(&self, source_language: &str, target_language: &str, cleaned_text: &str) -> Option<String> {
        let store = self.persistent.as_ref()?;
        let key = CacheKey::new(source_language, target_language, cleaned_text);

        match store.get(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Persistent cache read failed, treating as miss: {}", e);
                None
            }
        }
    }

    /// Write a translation through both tiers.
    ///
    /// The memory tier keeps the first value written for a key. The persistent
    /// write runs in the background; `flush` waits for it.
    pub fn store(&self, source_language: &str, target_language: &str, cleaned_text: &str, translated: &str) {
        let slot = self.memory_slot(source_language, target_language, cleaned_text);
        let _ = slot.set(translated.to_string());
        self.set_persistent(source_language, target_language, cleaned_text, translated);
    }

    /// Queue a write to the persistent tier
    pub fn set_persistent(&self, source_language: &str, target_language: &str, cleaned_text: &str, translated: &str) {
        let Some(store) = self.persistent.clone() else {
            return;
        };
        let key = CacheKey::new(source_language, target_language, cleaned_text);
        let translated = translated.to_string();

        self.pending_writes.lock().spawn(async move {
            if let Err(e) = store.set(&key, &translated).await {
                warn!("Persistent cache write failed: {}", e);
            }
        });
    }

    /// Wait for every queued persistent write to finish
    pub async fn flush(&self) {
        let mut pending = std::mem::take(&mut *self.pending_writes.lock());
        let count = pending.len();

        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                warn!("Persistent cache write task failed: {}", e);
            }
        }

        if count > 0 {
            debug!("Flushed {} persistent cache writes", count);
        }
    }

    /// Record a hit served outside `lookup` (e.g. after waiting on a slot)
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a miss served outside `lookup`
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Get cache statistics: hits, misses, hit rate
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Number of memory slots holding a translation
    pub fn memory_len(&self) -> usize {
        self.memory.lock().values().filter(|slot| slot.initialized()).count()
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::memory_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::CacheRepository;

    /// Store whose every operation fails
    struct BrokenStore;

    #[async_trait]
    impl PersistentCache for BrokenStore {
        async fn get(&self, _key: &CacheKey) -> Result<Option<String>, CacheError> {
            Err(CacheError::Task("disk on fire".to_string()))
        }

        async fn set(&self, _key: &CacheKey, _translated: &str) -> Result<(), CacheError> {
            Err(CacheError::Task("disk on fire".to_string()))
        }
    }

    #[test]
    fn test_hashText_shouldProduceConsistentHash() {
        assert_eq!(hash_text("Hello"), hash_text("Hello"));
        assert_ne!(hash_text("Hello"), hash_text("hello"));
        assert_eq!(hash_text("").len(), 64);
    }

    #[tokio::test]
    async fn test_lookup_afterStore_shouldHitMemory() {
        let cache = CacheStore::memory_only();
        cache.store("en", "fr", "Hello", "Bonjour");

        assert_eq!(cache.lookup("en", "fr", "Hello").await, LookupOutcome::Hit("Bonjour".to_string()));
        assert_eq!(cache.lookup("en", "es", "Hello").await, LookupOutcome::Miss);
        assert_eq!(cache.stats().0, 1);
        assert_eq!(cache.stats().1, 1);
    }

    #[tokio::test]
    async fn test_store_sameKeyTwice_shouldKeepFirstInMemory() {
        let cache = CacheStore::memory_only();
        cache.store("en", "fr", "Hello", "Bonjour");
        cache.store("en", "fr", "Hello", "Salut");

        assert_eq!(cache.lookup("en", "fr", "Hello").await.into_hit(), Some("Bonjour".to_string()));
        assert_eq!(cache.memory_len(), 1);
    }

    #[tokio::test]
    async fn test_store_withPersistent_shouldSurviveNewRun() {
        let repo = Arc::new(CacheRepository::new_in_memory().unwrap());

        let first_run = CacheStore::with_persistent(repo.clone());
        first_run.store("en", "fr", "Hello", "Bonjour");
        first_run.flush().await;

        let second_run = CacheStore::with_persistent(repo.clone());
        assert_eq!(second_run.lookup("en", "fr", "Hello").await.into_hit(), Some("Bonjour".to_string()));
        // promoted into memory
        assert_eq!(second_run.memory_len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_withBrokenStore_shouldMissWithoutFailing() {
        let cache = CacheStore::with_persistent(Arc::new(BrokenStore));
        cache.store("en", "fr", "Hello", "Bonjour");
        cache.flush().await;

        assert_eq!(cache.lookup("en", "fr", "Other").await, LookupOutcome::Miss);
        // memory tier still works
        assert!(cache.lookup("en", "fr", "Hello").await.into_hit().is_some());
    }

    #[tokio::test]
    async fn test_memorySlot_shouldBeSharedForSameKey() {
        let cache = CacheStore::memory_only();
        let a = cache.memory_slot("en", "fr", "Hello");
        let b = cache.memory_slot("en", "fr", "Hello");
        assert!(Arc::ptr_eq(&a, &b));
    }
}
