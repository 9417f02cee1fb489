//! Memoizing wrapper around one read operation
//!
//! ```rust,no_run
//! use bestiary_core::cache::ResultCache;
//! use std::time::Duration;
//!
//! # async fn example() -> bestiary_core::Result<()> {
//! let cache = ResultCache::new(1_000);
//! let square = cache.memoize("square", Duration::from_secs(60), |n: u64| async move {
//!     Ok::<_, bestiary_core::StoreError>(n * n)
//! });
//!
//! assert_eq!(square.call(12).await?, 144); // computed
//! assert_eq!(square.call(12).await?, 144); // served from the cache
//! # Ok(())
//! # }
//! ```

use super::ResultCache;
use crate::{Result, StoreError};
use futures::future::BoxFuture;
use serde::Serialize;
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

type Operation<A, T> = Box<dyn Fn(A) -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Derive the cache key for an operation name and its argument tuple.
///
/// Arguments are serialized as JSON, so the key is deterministic and
/// positional: `(1, 2)` and `(2, 1)` never share an entry.
pub fn cache_key<A: Serialize + ?Sized>(operation: &str, args: &A) -> Result<String> {
    let encoded = serde_json::to_string(args).map_err(|e| {
        StoreError::query(format!("Failed to encode cache key for {}: {}", operation, e))
    })?;
    Ok(format!("{}:{}", operation, encoded))
}

/// A read operation whose results are cached for `ttl`
pub struct Memoized<A, T> {
    cache: ResultCache,
    name: String,
    ttl: Duration,
    op: Operation<A, T>,
    _args: PhantomData<fn(A)>,
}

impl ResultCache {
    /// Wrap `op` so its results are cached under `name` for `ttl`
    pub fn memoize<A, T, F, Fut>(
        &self,
        name: impl Into<String>,
        ttl: Duration,
        op: F,
    ) -> Memoized<A, T>
    where
        A: 'static,
        T: 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Memoized {
            cache: self.clone(),
            name: name.into(),
            ttl,
            op: Box::new(move |args| -> BoxFuture<'static, Result<T>> { Box::pin(op(args)) }),
            _args: PhantomData,
        }
    }
}

impl<A, T> Memoized<A, T>
where
    A: Serialize,
    T: Clone + Send + Sync + 'static,
{
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Serve from the cache when a live entry exists, otherwise run the
    /// operation and store its `Ok` result.
    pub async fn call(&self, args: A) -> Result<T> {
        let key = cache_key(&self.name, &args)?;
        // The future is inert until polled; on a hit it is dropped unpolled.
        let pending = (self.op)(args);
        self.cache
            .get_or_try_insert(&self.name, key, self.ttl, pending)
            .await
    }

    /// Run the operation directly, neither reading nor writing the cache
    pub async fn call_uncached(&self, args: A) -> Result<T> {
        (self.op)(args).await
    }
}
