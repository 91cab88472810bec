//! Cache policy and store settings.
//!
//! Settings can be built in code or loaded from TOML:
//!
//! ```toml
//! max_size = 300
//! max_entry_age_ms = 1800000
//!
//! [default_policy]
//! stale_time_ms = 60000
//! cache_time_ms = 300000
//! swr = true
//!
//! [policies.tutors]
//! stale_time_ms = 120000
//! cache_time_ms = 600000
//! swr = true
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CacheError, ResourceType};

const DEFAULT_MAX_SIZE: usize = 500;
const DEFAULT_MAX_ENTRY_AGE_MS: u64 = 60 * 60 * 1_000;
const DEFAULT_EVICTION_FRACTION: f64 = 0.3;
const DEFAULT_STALE_TIME_MS: u64 = 2 * 60 * 1_000;
const DEFAULT_CACHE_TIME_MS: u64 = 10 * 60 * 1_000;

/// Freshness policy for one resource type.
///
/// * `stale_time_ms` - How long after a write the entry counts as fresh
/// * `cache_time_ms` - How long after a write the entry may still be served (stale)
/// * `swr` - Whether stale data is served while revalidating in the background;
///   when `false` a stale read blocks on a fresh fetch instead
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub stale_time_ms: u64,
    pub cache_time_ms: u64,
    #[serde(default = "default_swr")]
    pub swr: bool,
}

fn default_swr() -> bool {
    true
}

impl CacheConfig {
    /// Creates a policy, raising `cache_time_ms` to `stale_time_ms` if it is smaller.
    pub const fn new(stale_time_ms: u64, cache_time_ms: u64, swr: bool) -> Self {
        let cache_time_ms = if cache_time_ms < stale_time_ms {
            stale_time_ms
        } else {
            cache_time_ms
        };
        Self {
            stale_time_ms,
            cache_time_ms,
            swr,
        }
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.stale_time_ms)
    }

    pub fn cache_time(&self) -> Duration {
        Duration::from_millis(self.cache_time_ms)
    }

    /// Checks the `cache_time >= stale_time` invariant.
    pub fn validate(&self, resource: &str) -> Result<(), CacheError> {
        if self.cache_time_ms < self.stale_time_ms {
            return Err(CacheError::InvalidPolicy {
                resource: resource.to_string(),
                reason: format!(
                    "cache_time_ms ({}) must not be smaller than stale_time_ms ({})",
                    self.cache_time_ms, self.stale_time_ms
                ),
            });
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME_MS, DEFAULT_CACHE_TIME_MS, true)
    }
}

/// Store-wide settings, read-only once the store is constructed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Maximum number of entries. Eviction runs before inserting a new key
    /// once this many entries are stored.
    pub max_size: usize,
    /// Entries older than this are dropped first when eviction runs,
    /// regardless of their per-type policy or LRU rank.
    pub max_entry_age_ms: u64,
    /// Share of remaining entries removed by the LRU phase of eviction.
    pub eviction_fraction: f64,
    /// Skip a background revalidation's write-back when the entry was
    /// invalidated or replaced while the fetch was in flight.
    pub guard_revalidation_writeback: bool,
    /// Policy for entries without a resource type.
    pub default_policy: CacheConfig,
    /// Per-type overrides; types not listed keep [`ResourceType::default_policy`].
    pub policies: HashMap<ResourceType, CacheConfig>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            max_entry_age_ms: DEFAULT_MAX_ENTRY_AGE_MS,
            eviction_fraction: DEFAULT_EVICTION_FRACTION,
            guard_revalidation_writeback: true,
            default_policy: CacheConfig::default(),
            policies: HashMap::new(),
        }
    }
}

impl CacheSettings {
    /// Parses and validates settings from a TOML document.
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, CacheError> {
        let settings: CacheSettings = toml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from a TOML file, e.g. `tutorcache.toml`.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), CacheError> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidSettings {
                key: "max_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.eviction_fraction > 0.0 && self.eviction_fraction <= 1.0) {
            return Err(CacheError::InvalidSettings {
                key: "eviction_fraction",
                reason: format!("{} is outside (0, 1]", self.eviction_fraction),
            });
        }
        self.default_policy.validate("default")?;
        for (resource, policy) in &self.policies {
            policy.validate(resource.as_str())?;
        }
        Ok(())
    }

    /// Sets the maximum entry count (clamped to at least 1).
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    pub fn with_max_entry_age(mut self, age: Duration) -> Self {
        self.max_entry_age_ms = age.as_millis() as u64;
        self
    }

    pub fn with_policy(mut self, resource: ResourceType, policy: CacheConfig) -> Self {
        self.policies.insert(resource, policy);
        self
    }

    pub fn with_default_policy(mut self, policy: CacheConfig) -> Self {
        self.default_policy = policy;
        self
    }

    pub fn with_revalidation_guard(mut self, enabled: bool) -> Self {
        self.guard_revalidation_writeback = enabled;
        self
    }

    /// Resolves the policy an entry of `resource` is written with.
    pub fn policy_for(&self, resource: Option<ResourceType>) -> CacheConfig {
        match resource {
            Some(resource) => self
                .policies
                .get(&resource)
                .copied()
                .unwrap_or_else(|| resource.default_policy()),
            None => self.default_policy,
        }
    }

    /// `max_size` with a zero value read as 1.
    pub(crate) fn effective_max_size(&self) -> usize {
        self.max_size.max(1)
    }
}
