use std::collections::HashMap;

use crate::{CacheEntry, CacheSettings};

/// Two-phase policy that bounds the store size.
///
/// Eviction runs before a new key is inserted into a store that already holds
/// `max_size` entries:
///
/// 1. **Expiry and age ceiling** - every entry past its own `expires_at`, and
///    every entry older than `max_entry_age_ms`, is removed regardless of LRU
///    rank. This pass needs no sort and is usually enough on its own.
/// 2. **LRU** - if the store is still full, the remaining entries are ordered
///    by `last_accessed_at` (oldest first) and the oldest `eviction_fraction`
///    share is removed, rounded up and never fewer than one entry.
///
/// After eviction the store holds at most `max_size - 1` entries, so the
/// following insertion never pushes it above `max_size`.
///
/// # Examples
///
/// ```
/// use tutorcache_core::{CacheConfig, CacheEntry, CacheSettings, EvictionPolicy};
/// use std::collections::HashMap;
///
/// let policy = EvictionPolicy::from_settings(&CacheSettings::default().with_max_size(2));
/// let config = CacheConfig::default();
///
/// let mut entries = HashMap::new();
/// entries.insert("a:{}".to_string(), CacheEntry::new(1, 0, &config, None, 1));
/// entries.insert("b:{}".to_string(), CacheEntry::new(2, 5, &config, None, 2));
///
/// assert!(policy.needs_eviction(entries.len()));
/// let report = policy.evict(&mut entries, 10);
/// assert_eq!(report.lru, vec!["a:{}".to_string()]);
/// assert!(entries.contains_key("b:{}"));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvictionPolicy {
    max_size: usize,
    max_entry_age_ms: u64,
    fraction: f64,
}

/// Keys removed by one eviction pass, per phase.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvictionReport {
    pub expired: Vec<String>,
    pub aged_out: Vec<String>,
    pub lru: Vec<String>,
}

impl EvictionReport {
    pub fn total(&self) -> usize {
        self.expired.len() + self.aged_out.len() + self.lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl EvictionPolicy {
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self {
            max_size: settings.effective_max_size(),
            max_entry_age_ms: settings.max_entry_age_ms,
            fraction: settings.eviction_fraction.clamp(f64::MIN_POSITIVE, 1.0),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// True when inserting one more key requires eviction first.
    pub fn needs_eviction(&self, len: usize) -> bool {
        len >= self.max_size
    }

    /// Runs both phases against `entries` at time `now`.
    pub fn evict<T>(&self, entries: &mut HashMap<String, CacheEntry<T>>, now: u64) -> EvictionReport {
        let mut report = EvictionReport::default();
        if !self.needs_eviction(entries.len()) {
            return report;
        }

        let max_age = self.max_entry_age_ms;
        entries.retain(|key, entry| {
            if entry.is_expired(now) {
                report.expired.push(key.clone());
                false
            } else if entry.age(now) > max_age {
                report.aged_out.push(key.clone());
                false
            } else {
                true
            }
        });

        if self.needs_eviction(entries.len()) {
            report.lru = self.lru_victims(entries);
            for key in &report.lru {
                entries.remove(key);
            }
        }

        report
    }

    /// Picks the least recently accessed keys to remove.
    fn lru_victims<T>(&self, entries: &HashMap<String, CacheEntry<T>>) -> Vec<String> {
        let len = entries.len();
        // Enough to land strictly below max_size, and at least the configured share
        let required = len + 1 - self.max_size.min(len + 1);
        let share = (len as f64 * self.fraction).ceil() as usize;
        let count = share.max(required).max(1).min(len);

        let mut ranked: Vec<(&String, u64, u64)> = entries
            .iter()
            .map(|(key, entry)| (key, entry.last_accessed_at, entry.created_at))
            .collect();
        // Ties fall back to insertion time, then key, so eviction is deterministic
        ranked.sort_by(|a, b| (a.1, a.2, a.0).cmp(&(b.1, b.2, b.0)));

        ranked
            .into_iter()
            .take(count)
            .map(|(key, _, _)| key.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheConfig;
    use std::time::Duration;

    fn entries_at(times: &[(&str, u64)]) -> HashMap<String, CacheEntry<u64>> {
        let config = CacheConfig::new(1_000_000, 1_000_000, true);
        times
            .iter()
            .enumerate()
            .map(|(i, (key, t))| {
                (
                    key.to_string(),
                    CacheEntry::new(*t, *t, &config, None, i as u64),
                )
            })
            .collect()
    }

    #[test]
    fn test_no_eviction_below_max() {
        let policy = EvictionPolicy::from_settings(&CacheSettings::default().with_max_size(3));
        let mut entries = entries_at(&[("a", 0), ("b", 1)]);
        assert!(policy.evict(&mut entries, 10).is_empty());
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_age_ceiling_runs_first() {
        let settings = CacheSettings::default()
            .with_max_size(3)
            .with_max_entry_age(Duration::from_millis(100));
        let policy = EvictionPolicy::from_settings(&settings);
        let mut entries = entries_at(&[("old", 0), ("mid", 150), ("new", 190)]);

        let report = policy.evict(&mut entries, 200);
        assert_eq!(report.aged_out, vec!["old".to_string()]);
        assert!(report.lru.is_empty());
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_lru_removes_thirty_percent_rounded_up() {
        let policy = EvictionPolicy::from_settings(&CacheSettings::default().with_max_size(10));
        let times: Vec<(String, u64)> = (0..10).map(|i| (format!("k{i}"), i as u64)).collect();
        let refs: Vec<(&str, u64)> = times.iter().map(|(k, t)| (k.as_str(), *t)).collect();
        let mut entries = entries_at(&refs);

        let report = policy.evict(&mut entries, 20);
        assert_eq!(report.lru, vec!["k0", "k1", "k2"]);
        assert_eq!(entries.len(), 7);
    }

    #[test]
    fn test_lru_respects_recent_access() {
        let policy = EvictionPolicy::from_settings(&CacheSettings::default().with_max_size(3));
        let mut entries = entries_at(&[("a", 0), ("b", 1), ("c", 2)]);
        entries.get_mut("a").unwrap().touch(50);

        let report = policy.evict(&mut entries, 60);
        assert_eq!(report.lru, vec!["b".to_string()]);
        assert!(entries.contains_key("a"));
        assert!(entries.contains_key("c"));
    }

    #[test]
    fn test_small_store_evicts_at_least_one() {
        let policy = EvictionPolicy::from_settings(&CacheSettings::default().with_max_size(1));
        let mut entries = entries_at(&[("only", 0)]);
        let report = policy.evict(&mut entries, 1);
        assert_eq!(report.total(), 1);
        assert!(entries.is_empty());
    }

    #[test]
    fn test_store_over_capacity_is_brought_below_max() {
        // A store filled before max_size was lowered
        let policy = EvictionPolicy::from_settings(&CacheSettings::default().with_max_size(2));
        let times: Vec<(String, u64)> = (0..10).map(|i| (format!("k{i}"), i as u64)).collect();
        let refs: Vec<(&str, u64)> = times.iter().map(|(k, t)| (k.as_str(), *t)).collect();
        let mut entries = entries_at(&refs);

        policy.evict(&mut entries, 20);
        assert!(entries.len() < 2);
        assert!(entries.contains_key("k9"));
    }

    #[test]
    fn test_expired_entries_go_before_live_ones() {
        let policy = EvictionPolicy::from_settings(&CacheSettings::default().with_max_size(3));
        let mut entries = entries_at(&[("a", 0), ("b", 1)]);
        let short = CacheConfig::new(10_000, 60_000, false);
        let mut messages = CacheEntry::new(2, 2, &short, None, 9);
        messages.touch(50_000);
        entries.insert("messages".to_string(), messages);

        let report = policy.evict(&mut entries, 100_000);
        assert_eq!(report.expired, vec!["messages".to_string()]);
        assert!(report.aged_out.is_empty());
        assert!(report.lru.is_empty());
        assert!(entries.contains_key("a"));
        assert!(entries.contains_key("b"));
    }
}
