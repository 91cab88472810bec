use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

#[cfg(feature = "stats")]
use crate::CacheStats;
use crate::invalidation::UnclassifiedHook;
use crate::{
    CacheConfig, CacheEntry, CacheSettings, Classifier, Clock, EvictionPolicy, ResourceType,
    SystemClock,
};

/// Result of a [`CacheStore::get`].
///
/// A miss and an expired entry look the same (`data: None`, `is_expired: true`);
/// a merely stale entry still carries its data with `is_stale: true`, so callers
/// can choose between blocking on a refetch and serving while revalidating.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheLookup<T> {
    pub data: Option<T>,
    pub is_stale: bool,
    pub is_expired: bool,
}

impl<T> CacheLookup<T> {
    fn miss() -> Self {
        Self {
            data: None,
            is_stale: false,
            is_expired: true,
        }
    }

    /// True when data was returned and it is still fresh.
    pub fn is_fresh(&self) -> bool {
        self.data.is_some() && !self.is_stale
    }
}

/// Memory-resident response cache shared by the transport layer and every call site.
///
/// The store owns a single map from cache key to [`CacheEntry`]; nothing outside
/// this crate mutates entries directly. Construct one per application session
/// and hand it out by reference (or `Arc`).
///
/// # Type Parameters
///
/// * `T` - The cached payload, usually the decoded response body
///
/// # Examples
///
/// ```
/// use tutorcache_core::{CacheSettings, CacheStore, ManualClock, ResourceType};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let clock = Arc::new(ManualClock::new(0));
/// let store = CacheStore::with_clock(CacheSettings::default(), clock.clone());
///
/// store.set("tutors:{}", vec!["tutor-a"], Some(ResourceType::Tutors));
/// let lookup = store.get("tutors:{}");
/// assert_eq!(lookup.data, Some(vec!["tutor-a"]));
/// assert!(!lookup.is_stale);
///
/// // Past the tutors stale time (5 minutes) the data is still served, flagged stale
/// clock.advance(Duration::from_secs(301));
/// let lookup = store.get("tutors:{}");
/// assert_eq!(lookup.data, Some(vec!["tutor-a"]));
/// assert!(lookup.is_stale);
/// ```
pub struct CacheStore<T> {
    pub(crate) entries: RwLock<HashMap<String, CacheEntry<T>>>,
    pub(crate) settings: CacheSettings,
    pub(crate) eviction: EvictionPolicy,
    pub(crate) classifier: Classifier,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) generation: AtomicU64,
    pub(crate) unclassified_hook: RwLock<Option<UnclassifiedHook>>,
    #[cfg(feature = "stats")]
    pub(crate) stats: CacheStats,
}

impl<T> CacheStore<T> {
    /// Creates a store on the wall clock.
    pub fn new(settings: CacheSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Creates a store reading time from `clock`.
    pub fn with_clock(settings: CacheSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            eviction: EvictionPolicy::from_settings(&settings),
            settings,
            classifier: Classifier::default(),
            clock,
            generation: AtomicU64::new(0),
            unclassified_hook: RwLock::new(None),
            #[cfg(feature = "stats")]
            stats: CacheStats::new(),
        }
    }

    /// Replaces the default path classifier.
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Current time on the store's clock, in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Returns a reference to the cache statistics.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Stores `data` under `key` with the policy of `resource`.
    ///
    /// Replaces any existing entry, including its access statistics and its
    /// revalidation flag. When the key is new and the store is full, eviction
    /// runs first so the store never grows past `max_size`.
    pub fn set(&self, key: &str, data: T, resource: Option<ResourceType>) {
        self.set_with_config(key, data, resource, None);
    }

    /// Like [`set`](Self::set), with an explicit policy overriding the per-type one.
    pub fn set_with_config(
        &self,
        key: &str,
        data: T,
        resource: Option<ResourceType>,
        config: Option<CacheConfig>,
    ) {
        let config = config.unwrap_or_else(|| self.settings.policy_for(resource));
        let mut entries = self.entries.write();
        self.insert_locked(&mut entries, key, data, resource, &config);
    }

    pub(crate) fn insert_locked(
        &self,
        entries: &mut HashMap<String, CacheEntry<T>>,
        key: &str,
        data: T,
        resource: Option<ResourceType>,
        config: &CacheConfig,
    ) {
        let now = self.clock.now_ms();

        if !entries.contains_key(key) && self.eviction.needs_eviction(entries.len()) {
            let report = self.eviction.evict(entries, now);
            debug!(
                key,
                expired = report.expired.len(),
                aged_out = report.aged_out.len(),
                lru = report.lru.len(),
                remaining = entries.len(),
                "evicted cache entries before insert"
            );
            #[cfg(feature = "stats")]
            self.stats.record_evictions(report.total());
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        entries.insert(
            key.to_string(),
            CacheEntry::new(data, now, config, resource, generation),
        );
    }

    /// Removes one entry. Returns true if it existed.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read_recursive().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read_recursive().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read_recursive().is_empty()
    }

    /// Snapshot of all stored keys, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.read_recursive().keys().cloned().collect()
    }

    /// True while a background revalidation is in flight for `key`.
    pub fn is_revalidating(&self, key: &str) -> bool {
        self.entries
            .read_recursive()
            .get(key)
            .map_or(false, |entry| entry.is_revalidating)
    }

    /// Flags `key` as revalidating.
    ///
    /// Returns the entry's generation when the caller won the right to
    /// revalidate, or `None` if the entry is missing, still fresh, expired, or
    /// already being revalidated by someone else. The staleness check and the
    /// flag update happen under one write lock, so a caller holding an old
    /// stale read cannot start a second refetch of an entry that was just
    /// revalidated.
    pub fn begin_revalidation(&self, key: &str) -> Option<u64> {
        let now = self.clock.now_ms();
        let mut entries = self.entries.write();
        let entry = entries.get_mut(key)?;
        if entry.is_revalidating || !entry.is_stale(now) || entry.is_expired(now) {
            return None;
        }
        entry.is_revalidating = true;
        #[cfg(feature = "stats")]
        self.stats.record_revalidation();
        debug!(key, generation = entry.generation, "revalidation started");
        Some(entry.generation)
    }

    /// Writes the result of a successful background revalidation.
    ///
    /// With `guard_revalidation_writeback` enabled the write is skipped when
    /// the entry was invalidated or replaced after `generation` was handed out.
    /// Without the guard the data is written unconditionally, which can
    /// resurrect an entry that was deliberately invalidated mid-flight.
    ///
    /// Returns true if the data was written.
    pub fn complete_revalidation(
        &self,
        key: &str,
        generation: u64,
        data: T,
        resource: Option<ResourceType>,
    ) -> bool {
        let config = self.settings.policy_for(resource);
        let mut entries = self.entries.write();
        let current = entries.get(key).map(|entry| entry.generation);
        if self.settings.guard_revalidation_writeback && current != Some(generation) {
            debug!(
                key,
                generation,
                ?current,
                "revalidation result discarded, entry changed while in flight"
            );
            return false;
        }
        self.insert_locked(&mut entries, key, data, resource, &config);
        debug!(key, "revalidation stored");
        true
    }

    /// Clears the revalidating flag after a failed background refetch.
    ///
    /// The stale data stays in place; the next stale read retries.
    pub fn abort_revalidation(&self, key: &str, generation: u64) {
        #[cfg(feature = "stats")]
        self.stats.record_revalidation_failure();
        if let Some(entry) = self.entries.write().get_mut(key) {
            if entry.generation == generation {
                entry.is_revalidating = false;
            }
        }
    }
}

impl<T: Clone> CacheStore<T> {
    /// Reads `key`, updating its access statistics.
    ///
    /// An absent or expired key reports `is_expired: true` with no data, and an
    /// expired entry is removed so later reads miss as well.
    pub fn get(&self, key: &str) -> CacheLookup<T> {
        let now = self.clock.now_ms();
        let mut entries = self.entries.write();

        let Some(entry) = entries.get_mut(key) else {
            trace!(key, "cache miss");
            #[cfg(feature = "stats")]
            self.stats.record_miss();
            return CacheLookup::miss();
        };

        if entry.is_expired(now) {
            entries.remove(key);
            trace!(key, "cache entry expired");
            #[cfg(feature = "stats")]
            self.stats.record_miss();
            return CacheLookup::miss();
        }

        entry.touch(now);
        let is_stale = entry.is_stale(now);

        #[cfg(feature = "stats")]
        {
            if is_stale {
                self.stats.record_stale_hit();
            } else {
                self.stats.record_hit();
            }
        }
        trace!(key, is_stale, "cache hit");

        CacheLookup {
            data: Some(entry.data.clone()),
            is_stale,
            is_expired: false,
        }
    }

    /// Returns a copy of the entry without touching its access statistics.
    ///
    /// Expired entries are returned as-is; use [`get`](Self::get) for reads
    /// that honor expiry.
    pub fn peek(&self, key: &str) -> Option<CacheEntry<T>> {
        self.entries.read_recursive().get(key).cloned()
    }
}

impl<T> Default for CacheStore<T> {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}

impl<T> std::fmt::Debug for CacheStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("len", &self.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
