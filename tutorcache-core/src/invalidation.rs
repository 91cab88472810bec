//! # Cache Invalidation
//!
//! Mutation-driven invalidation on top of the entry store. There is no server
//! push channel, so the cache infers what went stale from the shape of the
//! outgoing request:
//! - **Exact**: drop one key
//! - **Pattern**: drop every key containing a substring
//! - **Resource**: drop every entry of a resource type, then one level of related types
//! - **Mutation**: classify a mutated path and invalidate its resource type
//!
//! # Examples
//!
//! ```rust
//! use tutorcache_core::{CacheSettings, CacheStore, HttpMethod, ResourceType};
//!
//! let store = CacheStore::new(CacheSettings::default());
//! store.set("/tutors:{}", "list", Some(ResourceType::Tutors));
//! store.set("/tutors/7/profile:{}", "profile", Some(ResourceType::TutorProfile));
//! store.set("/subjects:{}", "subjects", Some(ResourceType::Subjects));
//!
//! // A successful PUT on a tutor drops tutors, tutor profiles and favorites
//! store.invalidate_on_mutation("/tutors/7", HttpMethod::Put);
//! assert_eq!(store.keys(), vec!["/subjects:{}".to_string()]);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::{key_path, CacheEntry, CacheError, CacheStore, ResourceType};

/// Callback invoked when a mutation path cannot be classified.
pub type UnclassifiedHook = Arc<dyn Fn(&str, HttpMethod) + Send + Sync>;

/// HTTP verbs as seen by the invalidation engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// True for verbs with create/update/delete semantics.
    pub const fn is_mutation(self) -> bool {
        matches!(
            self,
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch | HttpMethod::Delete
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(CacheError::UnknownMethod(s.to_string())),
        }
    }
}

/// True when `entry` under `key` belongs to `resource`.
///
/// An entry matches if it was written with that resource type, if its key
/// contains the type's name, or if its path classifies as that type.
fn matches_resource<T>(
    store: &CacheStore<T>,
    key: &str,
    entry: &CacheEntry<T>,
    resource: ResourceType,
) -> bool {
    entry.resource == Some(resource)
        || key.contains(resource.as_str())
        || store.classifier.classify(key_path(key)) == Some(resource)
}

impl<T> CacheStore<T> {
    /// Removes exactly one key. Returns true if it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.delete(key);
        if removed {
            debug!(key, "invalidated cache entry");
            #[cfg(feature = "stats")]
            self.stats.record_invalidations(1);
        }
        removed
    }

    /// Removes every entry whose key satisfies `predicate`.
    ///
    /// The predicate runs under a shared lock. It may call the store's
    /// read-only accessors (`len`, `contains_key`, `keys`, `peek`,
    /// `is_revalidating`) but not `get` or anything that writes.
    /// An entry replaced between matching and removal is kept.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&str, &CacheEntry<T>) -> bool,
    {
        let matched: Vec<(String, u64)> = self
            .entries
            .read_recursive()
            .iter()
            .filter(|(key, entry)| predicate(key, entry))
            .map(|(key, entry)| (key.clone(), entry.generation))
            .collect();
        if matched.is_empty() {
            return 0;
        }

        let mut entries = self.entries.write();
        let mut removed = 0;
        for (key, generation) in matched {
            if entries.get(&key).map(|entry| entry.generation) == Some(generation) {
                entries.remove(&key);
                removed += 1;
            }
        }
        #[cfg(feature = "stats")]
        self.stats.record_invalidations(removed);
        removed
    }

    /// Removes every key containing `pattern`. O(store size).
    pub fn invalidate_pattern(&self, pattern: &str) -> usize {
        let removed = self.invalidate_where(|key, _| key.contains(pattern));
        debug!(pattern, removed, "invalidated cache entries by pattern");
        removed
    }

    /// Removes all entries of `resource` and, when `include_related` is set,
    /// all entries of each directly related type.
    ///
    /// Related types are expanded exactly one level; their own relations are
    /// not followed. Returns the number of entries removed.
    pub fn invalidate_resource(&self, resource: ResourceType, include_related: bool) -> usize {
        let related: &[ResourceType] = if include_related {
            resource.related()
        } else {
            &[]
        };

        let removed = self.invalidate_where(|key, entry| {
            matches_resource(self, key, entry, resource)
                || related
                    .iter()
                    .any(|&other| matches_resource(self, key, entry, other))
        });
        debug!(%resource, ?related, removed, "invalidated cache entries by resource");
        removed
    }

    /// Invalidates whatever a completed mutating request may have changed.
    ///
    /// Non-mutating verbs are ignored. A path the classifier does not recognize
    /// skips cache cleanup silently; the registered
    /// [`on_unclassified`](Self::on_unclassified) hook is told about it.
    pub fn invalidate_on_mutation(&self, path: &str, method: HttpMethod) -> usize {
        if !method.is_mutation() {
            return 0;
        }

        match self.classifier.classify(path) {
            Some(resource) => self.invalidate_resource(resource, true),
            None => {
                debug!(path, %method, "mutation on unclassified path, nothing invalidated");
                let hook = self.unclassified_hook.read().clone();
                if let Some(hook) = hook {
                    hook(path, method);
                }
                0
            }
        }
    }

    /// Registers a diagnostic callback for mutations on unclassified paths.
    ///
    /// Replaces any previously registered callback. It does not change what
    /// gets invalidated.
    pub fn on_unclassified<F>(&self, hook: F)
    where
        F: Fn(&str, HttpMethod) + Send + Sync + 'static,
    {
        *self.unclassified_hook.write() = Some(Arc::new(hook));
    }
}
