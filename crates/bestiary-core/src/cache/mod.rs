//! Result caching layer for bestiary-core
//!
//! `ResultCache` is a process-local, capacity-bounded table of read results
//! with a TTL per entry. `Memoized` wraps one read operation so repeated
//! calls with the same arguments are served from the cache until the entry
//! expires.
//!
//! Mutations never invalidate entries: a read served from the cache may be
//! up to one TTL stale. Callers that need fresh data after a write bypass the
//! cache (or disable it).

mod memoize;
mod result_cache;

pub use memoize::{cache_key, Memoized};
pub use result_cache::{CacheStats, OperationStats, ResultCache};
