//! Data-access-object cache
//!
//! [`CachedRepository`] wraps a repository so its read methods are answered
//! from the cache. A concrete adapter implements the repository's own trait
//! on `CachedRepository<Impl>` and routes each query method through
//! [`CachedRepository::query`], leaving call sites unchanged:
//!
//! ```ignore
//! #[async_trait]
//! impl<R: PageRepository + 'static> PageRepository for CachedRepository<R> {
//!     async fn find_by_slug(&self, slug: &str) -> Result<Option<Page>, DbError> {
//!         self.query("find_by_slug", slug.to_string(), |repo, slug| async move {
//!             repo.find_by_slug(&slug).await
//!         })
//!         .await
//!     }
//!
//!     async fn save(&self, page: Page) -> Result<(), DbError> {
//!         self.inner().save(page).await
//!     }
//! }
//! ```
//!
//! Writes go straight to [`CachedRepository::inner`]; nothing is
//! invalidated automatically.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::cache::CacheService;
use crate::error::CacheError;

/// Key prefix shared by every cached repository result.
pub const REPOSITORY_KEY_PREFIX: &str = "repo:";

pub struct CachedRepository<R> {
    inner: Arc<R>,
    cache: CacheService,
    namespace: String,
    ttl: Option<Duration>,
}

impl<R> CachedRepository<R> {
    /// Wraps `inner`; `namespace` separates keys of different repositories.
    pub fn new(cache: CacheService, namespace: impl Into<String>, inner: R) -> Self {
        Self {
            inner: Arc::new(inner),
            cache,
            namespace: namespace.into(),
            ttl: None,
        }
    }

    /// Overrides the cache default TTL for results of this repository.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// The wrapped repository, for calls that must bypass the cache.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Key for `method` called with `args`: `repo:<namespace>:<method>:<json args>`.
    pub fn key_for<A: Serialize + ?Sized>(
        &self,
        method: &str,
        args: &A,
    ) -> Result<String, CacheError> {
        let args = serde_json::to_string(args).map_err(|e| CacheError::Encode(e.to_string()))?;
        Ok(format!("{}{}", self.method_prefix(method), args))
    }

    fn method_prefix(&self, method: &str) -> String {
        format!("{}{}:{}:", REPOSITORY_KEY_PREFIX, self.namespace, method)
    }

    // == Query ==
    /// Answers `method(args)` from the cache, or runs `call` and caches its
    /// result.
    ///
    /// Errors from `call` are returned unchanged and never cached. The
    /// store lock is not held while `call` runs.
    pub async fn query<A, T, E, F, Fut>(&self, method: &str, args: A, call: F) -> Result<T, E>
    where
        A: Serialize,
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce(Arc<R>, A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = self.key_for(method, &args)?;

        if let Some(cached) = self.cache.get::<T>(&key).await {
            return Ok(cached);
        }

        debug!("Repository {}::{} miss, querying", self.namespace, method);
        let value = call(Arc::clone(&self.inner), args).await?;
        self.cache.set(&key, &value, self.ttl).await?;

        Ok(value)
    }

    // == Invalidation ==
    /// Drops cached results of one method, for every argument list.
    pub async fn invalidate_method(&self, method: &str) -> usize {
        self.cache
            .delete_by_pattern(&self.method_prefix(method))
            .await
    }

    /// Drops every cached result of this repository.
    pub async fn invalidate_all(&self) -> usize {
        let prefix = format!("{}{}:", REPOSITORY_KEY_PREFIX, self.namespace);
        self.cache.delete_by_pattern(&prefix).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        calls: AtomicUsize,
    }

    impl Counter {
        async fn double(&self, n: u32) -> Result<u32, CacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(n * 2)
        }
    }

    fn repo() -> CachedRepository<Counter> {
        CachedRepository::new(CacheService::default(), "numbers", Counter::default())
    }

    #[test]
    fn test_key_layout() {
        let repo = repo();
        let key = repo.key_for("find", &(7, "draft")).unwrap();
        assert_eq!(key, r#"repo:numbers:find:[7,"draft"]"#);
    }

    #[tokio::test]
    async fn test_query_caches_per_arguments() {
        let repo = repo();

        for _ in 0..3 {
            let v = repo
                .query("double", 21u32, |r, n| async move { r.double(n).await })
                .await
                .unwrap();
            assert_eq!(v, 42);
        }
        assert_eq!(repo.inner().calls.load(Ordering::SeqCst), 1);

        let v = repo
            .query("double", 5u32, |r, n| async move { r.double(n).await })
            .await
            .unwrap();
        assert_eq!(v, 10);
        assert_eq!(repo.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_method_and_all() {
        let repo = repo();

        repo.query("double", 1u32, |r, n| async move { r.double(n).await })
            .await
            .unwrap();
        repo.query("double", 2u32, |r, n| async move { r.double(n).await })
            .await
            .unwrap();

        assert_eq!(repo.invalidate_method("double").await, 2);
        assert_eq!(repo.invalidate_all().await, 0);
    }
}
