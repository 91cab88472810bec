//! # Tutorcache Async
//!
//! Stale-while-revalidate fetch orchestration for the tutorcache response cache.
//!
//! [`SwrCache`] wraps a [`CacheStore`](tutorcache_core::CacheStore) and decides,
//! per read, whether to answer from the cache, answer stale data while refetching
//! in the background, or block on the network.
//!
//! ## Features
//!
//! - **Instant stale reads**: stale entries are returned without waiting on the network
//! - **Single-flight revalidation**: at most one background refetch per key
//! - **Failure tolerant**: background failures are logged and the stale value kept
//! - **Tokio native**: revalidations are spawned on the current runtime
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! tutorcache-async = "0.4.0"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! ```rust
//! use serde_json::json;
//! use tutorcache_async::SwrCache;
//! use tutorcache_core::{CacheSettings, HttpMethod};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache: SwrCache<u32> = SwrCache::new(CacheSettings::default());
//! let params = json!({"subject": "math"});
//!
//! let count = cache
//!     .fetch_request("/tutors", Some(&params), || async { Ok::<_, String>(12) })
//!     .await
//!     .unwrap();
//! assert_eq!(count, 12);
//!
//! // A tutor was edited: everything tutor-shaped goes
//! assert_eq!(cache.invalidate_on_mutation("/tutors/7", HttpMethod::Put), 1);
//! # }
//! ```
mod swr;

pub use swr::SwrCache;

// Re-export the core so a single dependency is enough
pub use tutorcache_core;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::SwrCache;
    pub use tutorcache_core::{
        cache_key, CacheConfig, CacheSettings, CacheStore, HttpMethod, ResourceType,
    };
}
