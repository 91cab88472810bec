//! # Tutorcache Core
//!
//! Core building blocks of the tutorcache client-side response cache.
//!
//! The cache sits between the UI and the REST transport and keeps many
//! independently fetched resources (users, bookings, tutors, messages, ...)
//! consistent without a server push channel.
//!
//! ## Features
//!
//! - **Entry lifecycle**: every entry is fresh, then stale (still served), then expired
//! - **Per-resource policies**: stale and cache times picked from the resource type
//! - **Resource classification**: ordered, pre-compiled path rules map requests to types
//! - **Two-phase eviction**: age ceiling first, then least-recently-used entries
//! - **Invalidation**: exact, substring, by resource type with one level of related types
//! - **Optimistic updates**: apply a local change now, roll it back on failure
//! - **Statistics**: hit/miss, eviction and revalidation counters (with `stats` feature)
//!
//! ## Module Organization
//!
//! - `cache_entry` - Entry wrapper with lifecycle timestamps and LRU bookkeeping
//! - `cache_config` - Per-type policies and store settings (TOML loadable)
//! - [`resource`] - Resource types, related-resource graph and path classifier
//! - `keys` - Deterministic cache key generation
//! - `eviction_policy` - Age-ceiling + LRU eviction
//! - `store` - The entry store itself
//! - [`invalidation`] - Mutation-driven invalidation
//! - `optimistic` - Optimistic updates with rollback
//!
mod cache_config;
mod cache_entry;
mod clock;
mod error;
mod eviction_policy;
mod keys;
mod optimistic;
mod store;

pub mod invalidation;
pub mod resource;

#[cfg(feature = "stats")]
mod stats;

pub use cache_config::{CacheConfig, CacheSettings};
pub use cache_entry::CacheEntry;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::CacheError;
pub use eviction_policy::{EvictionPolicy, EvictionReport};
pub use invalidation::{HttpMethod, UnclassifiedHook};
pub use keys::{
    cache_key, cache_key_for, canonicalize, key_path, CacheableKey, RequestKey, KEY_SEPARATOR,
};
pub use optimistic::Rollback;
pub use resource::{Classifier, ClassifierRule, ResourceType};
pub use store::{CacheLookup, CacheStore};

#[cfg(feature = "stats")]
pub use stats::CacheStats;
