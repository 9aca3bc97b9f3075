//! Stale-while-revalidate read hook
//!
//! A resource binds a key to its fetcher. Reads are served from the cache
//! when possible; mutations write straight into the cache and may trigger a
//! background refetch that replaces the written value once it succeeds.
//! Background outcomes are published on a broadcast channel.
//!
//! Writes made through one resource are ordered by when they were started:
//! a fetch that finishes after a newer write has landed is discarded instead
//! of overwriting it.

use std::fmt::Display;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::CacheService;
use crate::error::CacheError;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Outcome of a background revalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevalidationEvent {
    /// The fetcher succeeded and its value replaced the cached one.
    Revalidated { key: String },
    /// A newer write landed while the fetch was running; its value was dropped.
    Superseded { key: String },
    /// The fetcher (or storing its value) failed; the cached value was kept.
    Failed { key: String, error: String },
}

impl RevalidationEvent {
    /// Key of the resource the event belongs to.
    pub fn key(&self) -> &str {
        match self {
            Self::Revalidated { key } | Self::Superseded { key } | Self::Failed { key, .. } => key,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MutateOptions {
    /// Refetch in the background after writing.
    pub revalidate: bool,
}

impl MutateOptions {
    /// Options that refetch after the write.
    pub fn revalidate() -> Self {
        Self { revalidate: true }
    }
}

/// New value for [`SwrResource::mutate`].
pub enum Mutation<T> {
    Value(T),
    /// Computes the new value from the cached one (`None` when absent).
    Update(Box<dyn FnOnce(Option<T>) -> T + Send>),
}

impl<T> Mutation<T> {
    /// Boxes an update closure.
    pub fn update(f: impl FnOnce(Option<T>) -> T + Send + 'static) -> Self {
        Self::Update(Box::new(f))
    }
}

// == Swr ==
/// Factory for [`SwrResource`]s sharing one cache and one event channel.
#[derive(Clone)]
pub struct Swr {
    cache: CacheService,
    events: broadcast::Sender<RevalidationEvent>,
    ttl: Option<Duration>,
}

impl Swr {
    /// Creates a factory storing into `cache` with its default TTL.
    pub fn new(cache: CacheService) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            cache,
            events,
            ttl: None,
        }
    }

    /// TTL for values written by resources created afterwards.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Receives every revalidation outcome from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<RevalidationEvent> {
        self.events.subscribe()
    }

    /// Binds `key` to `fetcher`.
    pub fn resource<T, F>(&self, key: impl Into<String>, fetcher: F) -> SwrResource<T, F> {
        SwrResource {
            swr: self.clone(),
            key: key.into(),
            fetcher: Arc::new(fetcher),
            order: Arc::new(WriteOrder::default()),
            _value: PhantomData,
        }
    }
}

// == Write Order ==
/// Tickets handed out when a write starts. A write commits only if no write
/// with a later ticket has committed already.
#[derive(Debug, Default)]
struct WriteOrder {
    issued: AtomicU64,
    committed: Mutex<u64>,
}

impl WriteOrder {
    fn ticket(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Stores `value` unless a newer write got there first.
    ///
    /// The commit lock is held across the store write so the check and the
    /// write cannot interleave with another commit.
    async fn commit<T: Serialize>(
        &self,
        ticket: u64,
        cache: &CacheService,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError> {
        let mut committed = self.committed.lock().await;
        if ticket < *committed {
            return Ok(false);
        }

        cache.set(key, value, ttl).await?;
        *committed = ticket;
        Ok(true)
    }
}

// == Resource ==
/// A key bound to its fetcher.
///
/// Write ordering covers writes made through this resource; separate
/// resources bound to the same key are last-writer-wins between each other.
pub struct SwrResource<T, F> {
    swr: Swr,
    key: String,
    fetcher: Arc<F>,
    order: Arc<WriteOrder>,
    _value: PhantomData<fn() -> T>,
}

impl<T, E, F, Fut> SwrResource<T, F>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
    E: Display + From<CacheError> + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    /// The cache key this resource reads and writes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Cached value without fetching.
    pub async fn cached(&self) -> Option<T> {
        self.swr.cache.get(&self.key).await
    }

    /// Returns the cached value, or fetches, caches and returns it.
    ///
    /// A cached value never triggers a fetch. Fetch errors are returned
    /// unchanged and leave the cache untouched. If a mutation lands while
    /// the fetch runs, the fetched value is returned but not stored.
    pub async fn read(&self) -> Result<T, E> {
        if let Some(value) = self.cached().await {
            return Ok(value);
        }

        debug!("SWR {}: empty, fetching", self.key);
        let ticket = self.order.ticket();
        let value = (self.fetcher)().await?;
        self.order
            .commit(ticket, &self.swr.cache, &self.key, &value, self.swr.ttl)
            .await?;
        Ok(value)
    }

    /// Writes a value straight into the cache and returns it.
    ///
    /// With `revalidate` set, a background fetch is started afterwards and
    /// overwrites the written value when it succeeds. The update closure
    /// sees the value cached at call time. Fetches started before this call
    /// can no longer overwrite the written value.
    pub async fn mutate(
        &self,
        mutation: Mutation<T>,
        options: MutateOptions,
    ) -> Result<T, CacheError> {
        let value = match mutation {
            Mutation::Value(value) => value,
            Mutation::Update(update) => update(self.cached().await),
        };

        let ticket = self.order.ticket();
        self.order
            .commit(ticket, &self.swr.cache, &self.key, &value, self.swr.ttl)
            .await?;

        if options.revalidate {
            // Detached; the outcome is reported on the event channel
            drop(self.revalidate());
        }

        Ok(value)
    }

    /// Refetches in the background, replacing the cached value on success.
    ///
    /// On failure the cached value is kept and a
    /// [`RevalidationEvent::Failed`] is published. A fetch overtaken by a
    /// newer write (a mutation or a later revalidation) is dropped and
    /// reported as [`RevalidationEvent::Superseded`].
    pub fn revalidate(&self) -> JoinHandle<()> {
        let cache = self.swr.cache.clone();
        let events = self.swr.events.clone();
        let ttl = self.swr.ttl;
        let key = self.key.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let order = Arc::clone(&self.order);
        let ticket = order.ticket();

        tokio::spawn(async move {
            let outcome = match fetcher().await {
                Ok(value) => order
                    .commit(ticket, &cache, &key, &value, ttl)
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            let event = match outcome {
                Ok(true) => {
                    debug!("SWR {}: revalidated", key);
                    RevalidationEvent::Revalidated { key }
                }
                Ok(false) => {
                    debug!("SWR {}: fetch superseded by a newer write", key);
                    RevalidationEvent::Superseded { key }
                }
                Err(error) => {
                    warn!(
                        "SWR {}: revalidation failed, keeping cached value: {}",
                        key, error
                    );
                    RevalidationEvent::Failed { key, error }
                }
            };

            // No subscribers is fine
            let _ = events.send(event);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Semaphore;

    type CountFuture = std::pin::Pin<Box<dyn Future<Output = Result<u32, CacheError>> + Send>>;

    fn counting_fetcher(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn() -> CountFuture + Send + Sync + 'static {
        move || -> CountFuture {
            let calls = Arc::clone(&calls);
            Box::pin(async move { Ok(calls.fetch_add(1, Ordering::SeqCst) as u32 + 100) })
        }
    }

    #[tokio::test]
    async fn test_read_fetches_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let swr = Swr::new(CacheService::default());
        let resource: SwrResource<u32, _> =
            swr.resource("counter", counting_fetcher(Arc::clone(&calls)));

        assert_eq!(resource.read().await.unwrap(), 100);
        assert_eq!(resource.read().await.unwrap(), 100);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mutate_without_revalidate_does_not_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let swr = Swr::new(CacheService::default());
        let resource: SwrResource<u32, _> =
            swr.resource("counter", counting_fetcher(Arc::clone(&calls)));

        let written = resource
            .mutate(Mutation::Value(7), MutateOptions::default())
            .await
            .unwrap();
        assert_eq!(written, 7);
        assert_eq!(resource.read().await.unwrap(), 7);

        let updated = resource
            .mutate(
                Mutation::update(|current: Option<u32>| current.unwrap_or(0) + 1),
                MutateOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(updated, 8);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_explicit_revalidate_replaces_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let swr = Swr::new(CacheService::default());
        let resource: SwrResource<u32, _> =
            swr.resource("counter", counting_fetcher(Arc::clone(&calls)));

        assert_eq!(resource.read().await.unwrap(), 100);
        resource.revalidate().await.unwrap();

        assert_eq!(resource.cached().await, Some(101));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_late_fetch_does_not_overwrite_mutation() {
        let gate = Arc::new(Semaphore::new(0));
        let swr = Swr::new(CacheService::default());
        let mut events = swr.subscribe();
        let resource: SwrResource<u32, _> = swr.resource("counter", {
            let gate = Arc::clone(&gate);
            move || -> CountFuture {
                let gate = Arc::clone(&gate);
                Box::pin(async move {
                    gate.acquire()
                        .await
                        .map_err(|e| CacheError::Internal(e.to_string()))?
                        .forget();
                    Ok(100)
                })
            }
        });

        let pending = resource.revalidate();
        resource
            .mutate(Mutation::Value(5), MutateOptions::default())
            .await
            .unwrap();

        gate.add_permits(1);
        pending.await.unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            RevalidationEvent::Superseded {
                key: "counter".to_string()
            }
        );
        assert_eq!(resource.cached().await, Some(5));
    }

    #[tokio::test]
    async fn test_write_order_drops_older_tickets() {
        let cache = CacheService::default();
        let order = WriteOrder::default();
        let older = order.ticket();
        let newer = order.ticket();

        assert!(order.commit(newer, &cache, "k", &2u32, None).await.unwrap());
        assert!(!order.commit(older, &cache, "k", &1u32, None).await.unwrap());
        assert_eq!(cache.get::<u32>("k").await, Some(2));
    }

    #[test]
    fn test_event_key() {
        let event = RevalidationEvent::Failed {
            key: "k".to_string(),
            error: "boom".to_string(),
        };
        assert_eq!(event.key(), "k");
    }
}
