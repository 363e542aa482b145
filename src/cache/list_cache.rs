//! Cache service shared by list fetchers.

use chrono::Duration;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::entry::CacheEntry;
use crate::session::Credential;
use crate::store::PersistedStore;

/// Entries younger than this are served without a network call.
pub const DEFAULT_TTL: std::time::Duration = std::time::Duration::from_secs(5 * 60);

/// Cache service over the persisted store.
///
/// Every operation takes the resource's cache key, so one service instance
/// serves every resource type.
#[derive(Clone)]
pub struct ListCache {
  store: PersistedStore,
  ttl: Duration,
  per_account: bool,
}

impl ListCache {
  pub fn new(store: PersistedStore, ttl: std::time::Duration) -> Self {
    Self {
      store,
      ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::minutes(5)),
      per_account: false,
    }
  }

  /// Namespace storage keys by the credential's account hash.
  pub fn with_per_account(mut self, enabled: bool) -> Self {
    self.per_account = enabled;
    self
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  /// The storage key for `resource_key` as seen by `credential`.
  pub fn storage_key(&self, resource_key: &str, credential: &Credential) -> String {
    if self.per_account {
      format!("{}:{}", credential.account_hash(), resource_key)
    } else {
      resource_key.to_string()
    }
  }

  /// Read the entry under `key` regardless of age.
  pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
    self.store.get(key)
  }

  /// Read the entry under `key` only if it is still fresh.
  pub fn read_fresh<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
    let entry = self.read::<T>(key)?;
    if entry.is_fresh(self.ttl) {
      Some(entry)
    } else {
      debug!(key, "cache entry is stale");
      None
    }
  }

  pub fn write<T: Serialize>(&self, key: &str, entry: &CacheEntry<T>) {
    self.store.set(key, entry);
  }

  pub fn invalidate(&self, key: &str) {
    debug!(key, "invalidating cache entry");
    self.store.remove(key);
  }

  /// Drop every entry `credential` can see under `resource_keys`.
  pub fn forget(&self, credential: &Credential, resource_keys: &[&str]) {
    for resource_key in resource_keys {
      self.invalidate(&self.storage_key(resource_key, credential));
    }
  }
}
