//! URL-keyed cache of raw upstream response bodies.
//!
//! Entries are write-once: no TTL, no eviction, no invalidation.

pub mod repo;
pub mod services;
pub mod upstream;

pub use repo::{CacheStore, PgCacheStore};
pub use services::{FetchError, ResponseCache};
pub use upstream::{Fetcher, HttpFetcher};
