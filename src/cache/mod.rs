//! Time-to-live cache for list resources.
//!
//! This module provides:
//! - `CacheEntry`: one cached page of records plus pagination and write time
//! - `ListCache`: the cache service injected into fetchers, keyed per resource
//!   and optionally per account

mod entry;
mod list_cache;

pub use entry::CacheEntry;
pub use list_cache::{ListCache, DEFAULT_TTL};
