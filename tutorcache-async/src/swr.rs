use std::fmt;
use std::future::Future;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, trace, warn};
use tutorcache_core::{cache_key, CacheSettings, CacheStore, ResourceType};

/// Registry entry for a background revalidation in flight.
struct InFlight {
    ticket: u64,
    done: watch::Receiver<bool>,
}

/// Cleanup for one background revalidation.
///
/// Runs on drop so a fetcher that panics, or a task dropped at runtime
/// shutdown, still releases the key and wakes waiters.
struct RevalidationGuard<T> {
    store: Arc<CacheStore<T>>,
    in_flight: Arc<DashMap<String, InFlight>>,
    key: String,
    generation: u64,
    ticket: u64,
    done: watch::Sender<bool>,
    settled: bool,
}

impl<T> Drop for RevalidationGuard<T> {
    fn drop(&mut self) {
        if !self.settled {
            warn!(key = %self.key, "background revalidation did not finish, releasing key");
            self.store.abort_revalidation(&self.key, self.generation);
        }
        let ticket = self.ticket;
        self.in_flight
            .remove_if(&self.key, |_, entry| entry.ticket == ticket);
        let _ = self.done.send(true);
    }
}

/// Stale-while-revalidate read path on top of a [`CacheStore`].
///
/// # Read behavior
///
/// - **Fresh hit**: returned immediately, the fetcher is never called
/// - **Stale hit**: returned immediately; if no revalidation is running for the
///   key, the fetcher is called once and its future is spawned on the current
///   Tokio runtime. Its result is written back when it resolves. Concurrent
///   stale reads of the same key never start a second fetch.
/// - **Miss / expired**: the fetcher is awaited, its result stored and returned.
///   A failure is returned verbatim and leaves the cache untouched.
///
/// Resource types whose policy has `swr = false` treat a stale hit like a miss.
///
/// Background failures are logged at `debug` level and dropped; the stale
/// data stays authoritative until the next successful revalidation or until
/// it expires.
///
/// `SwrCache` dereferences to its [`CacheStore`], so `set`, `invalidate_on_mutation`,
/// `optimistic_update` and friends are available directly.
///
/// # Examples
///
/// ```
/// use tutorcache_async::SwrCache;
/// use tutorcache_core::{CacheSettings, ResourceType};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache: SwrCache<Vec<String>> = SwrCache::new(CacheSettings::default());
///
/// let tutors = cache
///     .fetch("/tutors:{}", Some(ResourceType::Tutors), || async {
///         Ok::<_, std::io::Error>(vec!["Ada".to_string()])
///     })
///     .await
///     .unwrap();
/// assert_eq!(tutors, vec!["Ada".to_string()]);
///
/// // Served from the cache, the fetcher is not called again
/// let again = cache
///     .fetch("/tutors:{}", Some(ResourceType::Tutors), || async {
///         Err::<Vec<String>, _>(std::io::Error::other("network down"))
///     })
///     .await
///     .unwrap();
/// assert_eq!(again, tutors);
/// # }
/// ```
pub struct SwrCache<T> {
    store: Arc<CacheStore<T>>,
    in_flight: Arc<DashMap<String, InFlight>>,
    tickets: Arc<AtomicU64>,
}

impl<T> Clone for SwrCache<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            in_flight: Arc::clone(&self.in_flight),
            tickets: Arc::clone(&self.tickets),
        }
    }
}

impl<T> SwrCache<T> {
    /// Creates an orchestrator over a fresh store on the wall clock.
    pub fn new(settings: CacheSettings) -> Self {
        Self::from_store(Arc::new(CacheStore::new(settings)))
    }

    /// Wraps an existing store, e.g. one built with a custom clock or classifier.
    pub fn from_store(store: Arc<CacheStore<T>>) -> Self {
        Self {
            store,
            in_flight: Arc::new(DashMap::new()),
            tickets: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn store(&self) -> &Arc<CacheStore<T>> {
        &self.store
    }

    /// Number of background revalidations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Waits for the background revalidation of `key`, if one is in flight.
    ///
    /// Returns immediately when nothing is pending for the key.
    pub async fn wait_for_revalidation(&self, key: &str) {
        let done = self.in_flight.get(key).map(|entry| entry.done.clone());
        if let Some(mut done) = done {
            // A dropped sender means the task is gone, which is just as final
            let _ = done.wait_for(|finished| *finished).await;
        }
    }
}

impl<T> SwrCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Reads `key` with stale-while-revalidate semantics.
    ///
    /// `fetcher` is called at most once per invocation, and only when the
    /// cache cannot answer on its own or a stale entry needs revalidating.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error when there was no usable cached value.
    pub async fn fetch<F, Fut, E>(
        &self,
        key: &str,
        resource: Option<ResourceType>,
        fetcher: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let lookup = self.store.get(key);

        if let Some(data) = lookup.data {
            if !lookup.is_stale {
                return Ok(data);
            }
            if self.store.settings().policy_for(resource).swr {
                self.revalidate_in_background(key, resource, fetcher);
                return Ok(data);
            }
            debug!(key, "stale entry for non-swr resource, fetching before serving");
        }

        let data = fetcher().await?;
        self.store.set(key, data.clone(), resource);
        Ok(data)
    }

    /// Builds the cache key from `path` and `params`, classifies `path`, and
    /// reads through [`fetch`](Self::fetch).
    pub async fn fetch_request<F, Fut, E>(
        &self,
        path: &str,
        params: Option<&Value>,
        fetcher: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let key = cache_key(path, params);
        let resource = self.store.classifier().classify(path);
        self.fetch(&key, resource, fetcher).await
    }

    /// Starts a background refetch of `key` unless one is already running.
    ///
    /// Returns true if a revalidation was started.
    fn revalidate_in_background<F, Fut, E>(
        &self,
        key: &str,
        resource: Option<ResourceType>,
        fetcher: F,
    ) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        // Checked first so a read outside Tokio never claims the key
        let Ok(runtime) = Handle::try_current() else {
            warn!(key, "no Tokio runtime available, skipping background revalidation");
            return false;
        };

        let Some(generation) = self.store.begin_revalidation(key) else {
            trace!(key, "revalidation already in flight or entry no longer stale");
            return false;
        };

        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);
        let (done_tx, done_rx) = watch::channel(false);
        // Registered before spawning so the task's own cleanup always finds it
        self.in_flight.insert(
            key.to_string(),
            InFlight {
                ticket,
                done: done_rx,
            },
        );

        let mut guard = RevalidationGuard {
            store: Arc::clone(&self.store),
            in_flight: Arc::clone(&self.in_flight),
            key: key.to_string(),
            generation,
            ticket,
            done: done_tx,
            settled: false,
        };
        let request = fetcher();

        runtime.spawn(async move {
            match request.await {
                Ok(data) => {
                    guard
                        .store
                        .complete_revalidation(&guard.key, generation, data, resource);
                }
                Err(err) => {
                    debug!(key = %guard.key, error = %err, "background revalidation failed, keeping stale data");
                    guard.store.abort_revalidation(&guard.key, generation);
                }
            }
            guard.settled = true;
        });

        true
    }
}

impl<T> Deref for SwrCache<T> {
    type Target = CacheStore<T>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl<T> fmt::Debug for SwrCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwrCache")
            .field("store", &self.store)
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}
