//! # Tutorcache
//!
//! A client-side response cache for the tutoring marketplace REST API.
//!
//! It keeps users, tutors, bookings, messages and the rest of the marketplace's
//! resources consistent in memory without any server push channel:
//!
//! - **Stale-while-revalidate**: stale entries are served instantly while a single
//!   background refetch updates them
//! - **Per-resource policies**: each resource type has its own stale and cache times
//! - **Mutation-driven invalidation**: a `PUT /tutors/7` clears every tutor-shaped
//!   entry plus directly related resources (tutor profiles, favorites)
//! - **Bounded size**: an age ceiling plus LRU eviction keep the store below `max_size`
//! - **Optimistic updates**: show the result of a mutation before the server confirms it
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use tutorcache::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache: SwrCache<Vec<String>> = SwrCache::new(CacheSettings::default());
//!
//! // Miss: the fetcher runs and its result is cached
//! let tutors = cache
//!     .fetch_request("/tutors", Some(&json!({"subject": "math"})), || async {
//!         Ok::<_, String>(vec!["Ada".to_string()])
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(tutors, vec!["Ada".to_string()]);
//!
//! let key = cache_key("/tutors", Some(&json!({"subject": "math"})));
//! assert!(cache.get(&key).is_fresh());
//!
//! // A tutor changed on the server
//! cache.invalidate_on_mutation("/tutors/1", HttpMethod::Put);
//! assert!(!cache.contains_key(&key));
//! # }
//! ```
//!
//! ## Optimistic Updates
//!
//! ```rust
//! use tutorcache::prelude::*;
//!
//! let store = CacheStore::new(CacheSettings::default());
//! store.set("/favorites:{}", vec![1u64], Some(ResourceType::Favorites));
//!
//! let undo = store.optimistic_update(
//!     "/favorites:{}",
//!     |current| {
//!         let mut ids = current.cloned().unwrap_or_default();
//!         ids.push(2);
//!         ids
//!     },
//!     Some(ResourceType::Favorites),
//! );
//! assert_eq!(store.get("/favorites:{}").data, Some(vec![1, 2]));
//!
//! // The POST failed
//! undo.rollback();
//! assert_eq!(store.get("/favorites:{}").data, Some(vec![1]));
//! ```
//!
//! ## Configuration
//!
//! Store-wide settings and per-resource policies can be loaded from TOML with
//! [`CacheSettings::from_toml_str`] or [`CacheSettings::from_toml_file`]:
//!
//! ```rust
//! use tutorcache::{CacheSettings, ResourceType};
//!
//! let settings = CacheSettings::from_toml_str(
//!     r#"
//!     max_size = 200
//!
//!     [policies.bookings]
//!     stale_time_ms = 15000
//!     cache_time_ms = 60000
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(settings.policy_for(Some(ResourceType::Bookings)).stale_time_ms, 15_000);
//! ```
//!
//! ## Statistics
//!
//! With the default `stats` feature every store counts hits, stale hits, misses,
//! evictions, invalidations and revalidations, available via `CacheStore::stats()`.

pub use tutorcache_core::*;

pub use tutorcache_async::SwrCache;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::SwrCache;
    pub use tutorcache_core::{
        cache_key, cache_key_for, CacheConfig, CacheLookup, CacheSettings, CacheStore,
        HttpMethod, ResourceType, Rollback,
    };

    #[cfg(feature = "stats")]
    pub use tutorcache_core::CacheStats;
}
