//! Shared handles passed to every view.

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::EfilingClient;
use crate::cache::ListCache;
use crate::fetcher::ListFetcher;
use crate::list_query::ListQuery;
use crate::records::{Resource, CACHE_KEYS};
use crate::session::Session;

#[derive(Clone)]
pub struct Services {
  pub client: EfilingClient,
  pub cache: ListCache,
  pub session: Session,
  /// Period of the forced background refresh
  pub refresh_every: Duration,
}

impl Services {
  pub fn new(client: EfilingClient, cache: ListCache, session: Session) -> Self {
    let refresh_every = cache.ttl().to_std().unwrap_or(crate::cache::DEFAULT_TTL);
    Self {
      client,
      cache,
      session,
      refresh_every,
    }
  }

  pub fn fetcher<R: Resource>(&self) -> ListFetcher<R> {
    ListFetcher::new(self.client.clone(), self.cache.clone(), self.session.clone())
  }

  pub fn list_query<R: Resource>(&self) -> ListQuery<R> {
    ListQuery::new(self.fetcher(), self.refresh_every)
  }

  /// Forget the credential and its cached lists now, and tell the server in
  /// the background. Server errors are only logged.
  pub fn logout(&self) -> Option<JoinHandle<()>> {
    let credential = self.session.credential()?;
    self.session.clear();
    self.cache.forget(&credential, CACHE_KEYS);

    let client = self.client.clone();
    Some(tokio::spawn(async move {
      match client.logout(&credential).await {
        Ok(()) => info!("server session ended"),
        Err(e) => warn!(error = %e, "logout request failed"),
      }
    }))
  }
}
