use crate::CacheConfig;

/// A cached payload plus the timestamps that drive its lifecycle.
///
/// An entry moves through three states as the clock advances:
///
/// * **fresh** while `now <= stale_at`
/// * **stale** while `stale_at < now <= expires_at` (still served, revalidated in the background)
/// * **expired** once `now > expires_at` (removed on the next read)
///
/// # Type Parameters
///
/// * `T` - The type of the cached payload (opaque to the cache)
///
/// # Fields
///
/// * `data` - The cached payload
/// * `created_at`, `stale_at`, `expires_at` - Lifecycle timestamps in milliseconds,
///   always ordered `created_at <= stale_at <= expires_at`
/// * `access_count`, `last_accessed_at` - Updated on every successful read, used for LRU
/// * `is_revalidating` - Set while a background refetch for this key is in flight
/// * `generation` - Store-wide write sequence number, used to detect replaced entries
///
/// # Examples
///
/// ```
/// use tutorcache_core::{CacheConfig, CacheEntry};
///
/// let entry = CacheEntry::new("tutors", 1_000, &CacheConfig::new(100, 500, true), None, 1);
/// assert_eq!(entry.stale_at, 1_100);
/// assert_eq!(entry.expires_at, 1_500);
///
/// assert!(!entry.is_stale(1_100));
/// assert!(entry.is_stale(1_101));
/// assert!(!entry.is_expired(1_500));
/// assert!(entry.is_expired(1_501));
/// ```
#[derive(Clone, Debug)]
pub struct CacheEntry<T> {
    pub data: T,
    pub created_at: u64,
    pub stale_at: u64,
    pub expires_at: u64,
    pub access_count: u64,
    pub last_accessed_at: u64,
    pub is_revalidating: bool,
    pub resource: Option<crate::ResourceType>,
    pub generation: u64,
}

impl<T> CacheEntry<T> {
    /// Creates an entry written at `now` under the given policy.
    ///
    /// The policy's `cache_time_ms` is never allowed to undercut its
    /// `stale_time_ms`, so the timestamp ordering invariant always holds.
    pub fn new(
        data: T,
        now: u64,
        config: &CacheConfig,
        resource: Option<crate::ResourceType>,
        generation: u64,
    ) -> Self {
        let stale_at = now.saturating_add(config.stale_time_ms);
        let expires_at = now
            .saturating_add(config.cache_time_ms)
            .max(stale_at);
        Self {
            data,
            created_at: now,
            stale_at,
            expires_at,
            access_count: 0,
            last_accessed_at: now,
            is_revalidating: false,
            resource,
            generation,
        }
    }

    /// Returns true once `now` has passed `stale_at`.
    pub fn is_stale(&self, now: u64) -> bool {
        now > self.stale_at
    }

    /// Returns true once `now` has passed `expires_at`.
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.expires_at
    }

    /// Age of the entry at `now`, in milliseconds.
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }

    /// Records a successful read at `now`.
    pub fn touch(&mut self, now: u64) {
        self.access_count = self.access_count.saturating_add(1);
        self.last_accessed_at = now;
    }
}
