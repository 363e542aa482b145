//! Cached list entries.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::api::types::PaginationMeta;

/// A cached page of records.
///
/// `timestamp` is the instant the entry was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
  pub data: Vec<T>,
  pub pagination: Option<PaginationMeta>,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub timestamp: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
  /// Create an entry stamped with the current time.
  pub fn new(data: Vec<T>, pagination: Option<PaginationMeta>) -> Self {
    Self::written_at(data, pagination, Utc::now())
  }

  /// Create an entry stamped with `timestamp`, truncated to the millisecond
  /// precision it is stored with.
  pub fn written_at(data: Vec<T>, pagination: Option<PaginationMeta>, timestamp: DateTime<Utc>) -> Self {
    Self {
      data,
      pagination,
      timestamp: timestamp.trunc_subsecs(3),
    }
  }

  /// Age of the entry at `now`.
  pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
    now - self.timestamp
  }

  /// Fresh iff `now - timestamp < ttl`.
  pub fn is_fresh_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
    self.age_at(now) < ttl
  }

  pub fn is_fresh(&self, ttl: Duration) -> bool {
    self.is_fresh_at(Utc::now(), ttl)
  }
}
