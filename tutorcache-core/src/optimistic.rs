use tracing::debug;

use crate::{CacheStore, ResourceType};

/// Undo handle returned by [`CacheStore::optimistic_update`].
///
/// Call [`rollback`](Self::rollback) when the mutation fails. Dropping the
/// handle (or calling [`commit`](Self::commit)) keeps the optimistic value.
/// The cache never learns whether the request succeeded, so invoking the
/// rollback is the caller's obligation.
#[must_use = "call `rollback()` if the mutation fails, or `commit()` to keep the optimistic value"]
pub struct Rollback<'a, T> {
    store: &'a CacheStore<T>,
    key: String,
    snapshot: Option<T>,
    resource: Option<ResourceType>,
}

impl<'a, T> Rollback<'a, T> {
    /// Restores the value cached before the optimistic update.
    ///
    /// If nothing was cached, the key is invalidated instead so the fabricated
    /// value does not outlive the failed mutation.
    pub fn rollback(self) {
        match self.snapshot {
            Some(previous) => {
                debug!(key = %self.key, "optimistic update rolled back");
                self.store.set(&self.key, previous, self.resource);
            }
            None => {
                debug!(key = %self.key, "optimistic update rolled back, no prior value");
                self.store.invalidate(&self.key);
            }
        }
    }

    /// Keeps the optimistic value.
    pub fn commit(self) {}

    /// The value that a rollback would restore.
    pub fn snapshot(&self) -> Option<&T> {
        self.snapshot.as_ref()
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<T: Clone> CacheStore<T> {
    /// Applies `updater` to the cached value of `key` immediately.
    ///
    /// The updater receives the current value (`None` on a miss or expired
    /// entry) and its result is stored at once. A deep copy of the previous
    /// value is kept in the returned [`Rollback`].
    ///
    /// # Examples
    ///
    /// ```
    /// use tutorcache_core::{CacheSettings, CacheStore, ResourceType};
    ///
    /// let store = CacheStore::new(CacheSettings::default());
    /// store.set("/favorites:{}", 1u32, Some(ResourceType::Favorites));
    ///
    /// let undo = store.optimistic_update(
    ///     "/favorites:{}",
    ///     |count| count.map_or(1, |c| c + 1),
    ///     Some(ResourceType::Favorites),
    /// );
    /// assert_eq!(store.get("/favorites:{}").data, Some(2));
    ///
    /// undo.rollback();
    /// assert_eq!(store.get("/favorites:{}").data, Some(1));
    /// ```
    pub fn optimistic_update<F>(
        &self,
        key: &str,
        updater: F,
        resource: Option<ResourceType>,
    ) -> Rollback<'_, T>
    where
        F: FnOnce(Option<&T>) -> T,
    {
        let snapshot = self.get(key).data;
        let next = updater(snapshot.as_ref());
        self.set(key, next, resource);
        debug!(key, had_value = snapshot.is_some(), "optimistic update applied");

        Rollback {
            store: self,
            key: key.to_string(),
            snapshot,
            resource,
        }
    }
}
