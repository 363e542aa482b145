//! Persisted key-value store.
//!
//! Values are serialized as JSON and kept under plain string keys. Backends
//! report failures through `Result`, but [`PersistedStore`] swallows them:
//! a failed read is a miss and a failed write is a no-op.

mod sqlite;

use color_eyre::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

pub use sqlite::SqliteStore;

/// Raw byte-level storage backend.
pub trait KvStore: Send + Sync {
  /// Read the bytes stored under `key`.
  fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>>;

  /// Store `value` under `key`, replacing any prior value.
  fn set_raw(&self, key: &str, value: &[u8]) -> Result<()>;

  /// Delete the value under `key`. Missing keys are not an error.
  fn remove(&self, key: &str) -> Result<()>;
}

/// Backend that keeps nothing. Used when caching is disabled.
pub struct NoopStore;

impl KvStore for NoopStore {
  fn get_raw(&self, _key: &str) -> Result<Option<Vec<u8>>> {
    Ok(None)
  }

  fn set_raw(&self, _key: &str, _value: &[u8]) -> Result<()> {
    Ok(())
  }

  fn remove(&self, _key: &str) -> Result<()> {
    Ok(())
  }
}

/// Typed, failure-tolerant handle over a [`KvStore`] backend.
///
/// Shared by every consumer in the process; there is no locking discipline
/// above the backend, so concurrent writers to one key are last-write-wins.
#[derive(Clone)]
pub struct PersistedStore {
  backend: Arc<dyn KvStore>,
}

impl PersistedStore {
  pub fn new(backend: impl KvStore + 'static) -> Self {
    Self {
      backend: Arc::new(backend),
    }
  }

  /// A store that never retains anything.
  pub fn disabled() -> Self {
    Self::new(NoopStore)
  }

  /// Value previously stored under `key`, or `None` if it was never set,
  /// the backend failed, or the stored bytes no longer deserialize.
  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let bytes = match self.backend.get_raw(key) {
      Ok(Some(bytes)) => bytes,
      Ok(None) => return None,
      Err(e) => {
        warn!(key, error = %e, "store read failed, treating as miss");
        return None;
      }
    };

    match serde_json::from_slice(&bytes) {
      Ok(value) => Some(value),
      Err(e) => {
        debug!(key, error = %e, "stored value no longer deserializes");
        None
      }
    }
  }

  /// Serialize and store `value` under `key`.
  pub fn set<T: Serialize>(&self, key: &str, value: &T) {
    let bytes = match serde_json::to_vec(value) {
      Ok(bytes) => bytes,
      Err(e) => {
        warn!(key, error = %e, "failed to serialize value for store");
        return;
      }
    };

    if let Err(e) = self.backend.set_raw(key, &bytes) {
      warn!(key, error = %e, "store write failed");
    }
  }

  pub fn remove(&self, key: &str) {
    if let Err(e) = self.backend.remove(key) {
      warn!(key, error = %e, "store remove failed");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use color_eyre::eyre::eyre;
  use serde::Deserialize;

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Note {
    title: String,
    pages: u32,
  }

  /// Backend where every operation fails.
  struct BrokenStore;

  impl KvStore for BrokenStore {
    fn get_raw(&self, _key: &str) -> Result<Option<Vec<u8>>> {
      Err(eyre!("disk on fire"))
    }

    fn set_raw(&self, _key: &str, _value: &[u8]) -> Result<()> {
      Err(eyre!("quota exceeded"))
    }

    fn remove(&self, _key: &str) -> Result<()> {
      Err(eyre!("read-only"))
    }
  }

  fn memory_store() -> PersistedStore {
    PersistedStore::new(SqliteStore::in_memory().unwrap())
  }

  #[test]
  fn test_set_then_get() {
    let store = memory_store();
    let note = Note {
      title: "agenda".to_string(),
      pages: 3,
    };

    store.set("note", &note);
    assert_eq!(store.get::<Note>("note"), Some(note));
  }

  #[test]
  fn test_get_missing_key() {
    let store = memory_store();
    assert_eq!(store.get::<Note>("nothing"), None);
  }

  #[test]
  fn test_set_replaces_prior_value() {
    let store = memory_store();
    store.set("count", &1u32);
    store.set("count", &2u32);
    assert_eq!(store.get::<u32>("count"), Some(2));
  }

  #[test]
  fn test_remove() {
    let store = memory_store();
    store.set("token", &"abc");
    store.remove("token");
    assert_eq!(store.get::<String>("token"), None);

    // Removing again is a no-op
    store.remove("token");
  }

  #[test]
  fn test_undeserializable_value_is_a_miss() {
    let store = memory_store();
    store.set("note", &"just a string");
    assert_eq!(store.get::<Note>("note"), None);
  }

  #[test]
  fn test_backend_failures_are_swallowed() {
    let store = PersistedStore::new(BrokenStore);
    store.set("key", &42u32);
    store.remove("key");
    assert_eq!(store.get::<u32>("key"), None);
  }

  #[test]
  fn test_disabled_store_retains_nothing() {
    let store = PersistedStore::disabled();
    store.set("key", &42u32);
    assert_eq!(store.get::<u32>("key"), None);
  }
}
