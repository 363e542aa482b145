//! Per-view state for a cached list.
//!
//! A `ListQuery` owns the `FetchState` of one mounted list. Fetches and
//! mutations run on tokio tasks and report back over a channel; `poll()`
//! applies their results from the UI loop, one at a time.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::types::PaginationMeta;
use crate::cache::CacheEntry;
use crate::fetcher::{FetchOutcome, FetchPlan, ListFetcher, MutationError, MISSING_CREDENTIAL};
use crate::records::{NewEntry, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
  Idle,
  Loading,
  Ready,
  Failed,
}

/// Where the displayed data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
  Cache,
  Network,
  /// Cached data shown after a failed fetch.
  StaleCache,
}

/// What a consumer renders.
#[derive(Debug, Clone)]
pub struct FetchState<R> {
  pub data: Vec<R>,
  pub pagination: Option<PaginationMeta>,
  pub loading: bool,
  pub error: Option<String>,
  pub last_updated: Option<DateTime<Utc>>,
  pub source: Option<DataSource>,
}

impl<R> Default for FetchState<R> {
  fn default() -> Self {
    Self {
      data: Vec::new(),
      pagination: None,
      loading: false,
      error: None,
      last_updated: None,
      source: None,
    }
  }
}

impl<R> FetchState<R> {
  pub fn status(&self) -> FetchStatus {
    if self.loading {
      FetchStatus::Loading
    } else if self.error.is_some() {
      FetchStatus::Failed
    } else if self.last_updated.is_some() {
      FetchStatus::Ready
    } else {
      FetchStatus::Idle
    }
  }

  /// Settle the state from a finished fetch. Always clears `loading`.
  pub fn apply(&mut self, outcome: FetchOutcome<R>) {
    self.loading = false;

    match outcome {
      FetchOutcome::CacheHit(entry) => {
        self.adopt(entry, DataSource::Cache);
        self.error = None;
      }
      FetchOutcome::Fetched(entry) => {
        self.adopt(entry, DataSource::Network);
        self.error = None;
      }
      FetchOutcome::Failed { error, fallback } => {
        self.error = Some(error);
        match fallback {
          Some(entry) => self.adopt(entry, DataSource::StaleCache),
          None => {
            self.data.clear();
            self.pagination = None;
            self.source = None;
          }
        }
      }
      FetchOutcome::Unauthorized => {
        self.error = Some("session expired".to_string());
      }
      FetchOutcome::MissingCredential => {
        self.error = Some(MISSING_CREDENTIAL.to_string());
      }
    }
  }

  fn adopt(&mut self, entry: CacheEntry<R>, source: DataSource) {
    self.data = entry.data;
    self.pagination = entry.pagination;
    self.last_updated = Some(entry.timestamp);
    self.source = Some(source);
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
  Add,
  Delete,
}

/// Progress of the last add or delete.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationStatus {
  Idle,
  Submitting(MutationKind),
  Succeeded(MutationKind),
  Failed(MutationKind, MutationError),
}

enum QueryMsg<R> {
  Fetched {
    generation: u64,
    outcome: FetchOutcome<R>,
  },
  RefreshDue,
  Mutated {
    kind: MutationKind,
    result: Result<FetchOutcome<R>, MutationError>,
  },
}

/// A mounted list: fetch state, periodic refresh and mutations.
///
/// Each dispatched fetch gets a generation number and only the latest one is
/// applied. Results that arrive after the query is dropped go nowhere.
pub struct ListQuery<R: Resource> {
  fetcher: ListFetcher<R>,
  state: FetchState<R>,
  generation: u64,
  tx: mpsc::UnboundedSender<QueryMsg<R>>,
  rx: mpsc::UnboundedReceiver<QueryMsg<R>>,
  refresh_every: Duration,
  refresh_task: Option<JoinHandle<()>>,
  mutation: MutationStatus,
  signed_out: bool,
}

impl<R: Resource> ListQuery<R> {
  pub fn new(fetcher: ListFetcher<R>, refresh_every: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      fetcher,
      state: FetchState::default(),
      generation: 0,
      tx,
      rx,
      refresh_every,
      refresh_task: None,
      mutation: MutationStatus::Idle,
      signed_out: false,
    }
  }

  /// Initial fetch plus the periodic forced refresh.
  pub fn start(&mut self) {
    self.fetch();

    if self.refresh_task.is_some() || self.refresh_every.is_zero() {
      return;
    }

    let tx = self.tx.clone();
    let period = self.refresh_every;
    self.refresh_task = Some(tokio::spawn(async move {
      let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
      loop {
        ticker.tick().await;
        if tx.send(QueryMsg::RefreshDue).is_err() {
          break;
        }
      }
    }));
  }

  pub fn state(&self) -> &FetchState<R> {
    &self.state
  }

  pub fn data(&self) -> &[R] {
    &self.state.data
  }

  pub fn is_loading(&self) -> bool {
    self.state.loading
  }

  pub fn fetcher(&self) -> &ListFetcher<R> {
    &self.fetcher
  }

  /// Serve from a fresh cache entry if there is one, else fetch.
  pub fn fetch(&mut self) {
    self.dispatch(false);
  }

  /// Always fetch from the server.
  pub fn refetch(&mut self) {
    self.dispatch(true);
  }

  fn dispatch(&mut self, force: bool) {
    // Anything still in flight is superseded from here on
    self.generation += 1;

    match self.fetcher.plan(force) {
      FetchPlan::Ready(outcome) => self.settle(outcome),
      FetchPlan::Network(credential) => {
        self.state.loading = true;

        let generation = self.generation;
        let fetcher = self.fetcher.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
          let outcome = fetcher.fetch_remote(&credential).await;
          let _ = tx.send(QueryMsg::Fetched { generation, outcome });
        });
      }
    }
  }

  fn settle(&mut self, outcome: FetchOutcome<R>) {
    if outcome.is_unauthorized() {
      self.signed_out = true;
    }
    self.state.apply(outcome);
  }

  /// Submit a new entry. Refused while another mutation is in flight.
  pub fn add(&mut self, entry: NewEntry) -> Result<(), MutationError> {
    self.begin_mutation(MutationKind::Add)?;

    let fetcher = self.fetcher.clone();
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = fetcher.add_entry(entry).await;
      let _ = tx.send(QueryMsg::Mutated {
        kind: MutationKind::Add,
        result,
      });
    });
    Ok(())
  }

  /// Delete a record. Refused while another mutation is in flight.
  pub fn delete(&mut self, id: String) -> Result<(), MutationError> {
    self.begin_mutation(MutationKind::Delete)?;

    let fetcher = self.fetcher.clone();
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = fetcher.delete_entry(&id).await;
      let _ = tx.send(QueryMsg::Mutated {
        kind: MutationKind::Delete,
        result,
      });
    });
    Ok(())
  }

  fn begin_mutation(&mut self, kind: MutationKind) -> Result<(), MutationError> {
    if let MutationStatus::Submitting(pending) = self.mutation {
      debug!(resource = R::PATH, ?pending, ?kind, "mutation refused, another in flight");
      return Err(MutationError::Busy);
    }
    self.mutation = MutationStatus::Submitting(kind);
    Ok(())
  }

  pub fn mutation(&self) -> &MutationStatus {
    &self.mutation
  }

  /// Take a finished mutation's status, leaving `Idle`.
  pub fn take_mutation(&mut self) -> Option<MutationStatus> {
    match self.mutation {
      MutationStatus::Succeeded(_) | MutationStatus::Failed(..) => {
        Some(std::mem::replace(&mut self.mutation, MutationStatus::Idle))
      }
      _ => None,
    }
  }

  /// Whether the server rejected the credential.
  pub fn signed_out(&self) -> bool {
    self.signed_out
  }

  /// Apply whatever finished since the last call. Returns true if anything
  /// changed.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;

    while let Ok(msg) = self.rx.try_recv() {
      match msg {
        QueryMsg::Fetched { generation, outcome } => {
          if generation != self.generation {
            debug!(resource = R::PATH, generation, "discarding superseded fetch");
            continue;
          }
          self.settle(outcome);
        }
        QueryMsg::RefreshDue => {
          debug!(resource = R::PATH, "periodic refresh");
          self.refetch();
        }
        QueryMsg::Mutated { kind, result } => match result {
          Ok(outcome) => {
            // The post-mutation refetch is the newest server state
            self.generation += 1;
            self.settle(outcome);
            self.mutation = MutationStatus::Succeeded(kind);
          }
          Err(error) => {
            if error == MutationError::Unauthorized {
              self.signed_out = true;
            }
            self.mutation = MutationStatus::Failed(kind, error);
          }
        },
      }
      changed = true;
    }

    changed
  }
}

impl<R: Resource> Drop for ListQuery<R> {
  fn drop(&mut self) {
    if let Some(task) = self.refresh_task.take() {
      task.abort();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::EfilingClient;
  use crate::cache::{ListCache, DEFAULT_TTL};
  use crate::records::SuratMasuk;
  use crate::session::{Credential, Session};
  use crate::store::{PersistedStore, SqliteStore};
  use serde_json::{json, Value};
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  const TOKEN: &str = "tok";

  fn list_body(ids: &[&str]) -> Value {
    let records: Vec<Value> = ids
      .iter()
      .map(|id| json!({ "no_surat_masuk": id, "tanggal": "2024-01-02" }))
      .collect();
    json!({
      "data": {
        "paginatedData": records,
        "meta": { "currentPage": 1, "itemsPerPage": 10, "totalItems": ids.len(), "totalPages": 1 }
      }
    })
  }

  fn setup(server: &MockServer) -> (ListFetcher<SuratMasuk>, ListCache, Session) {
    let store = PersistedStore::new(SqliteStore::in_memory().unwrap());
    let session = Session::new(store.clone());
    session.login(TOKEN);
    let cache = ListCache::new(store, DEFAULT_TTL);
    let client = EfilingClient::new(&server.uri()).unwrap();
    (ListFetcher::new(client, cache.clone(), session.clone()), cache, session)
  }

  async fn settle(query: &mut ListQuery<SuratMasuk>) {
    for _ in 0..100 {
      query.poll();
      if !query.is_loading() && !matches!(query.mutation(), MutationStatus::Submitting(_)) {
        return;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("query did not settle");
  }

  #[test]
  fn test_status_transitions() {
    let mut state: FetchState<u32> = FetchState::default();
    assert_eq!(state.status(), FetchStatus::Idle);

    state.loading = true;
    assert_eq!(state.status(), FetchStatus::Loading);

    state.apply(FetchOutcome::Fetched(CacheEntry::new(vec![1], None)));
    assert_eq!(state.status(), FetchStatus::Ready);
    assert!(!state.loading);
    assert_eq!(state.source, Some(DataSource::Network));

    state.apply(FetchOutcome::Failed {
      error: "failed to fetch data".to_string(),
      fallback: None,
    });
    assert_eq!(state.status(), FetchStatus::Failed);
    assert!(state.data.is_empty());
  }

  #[test]
  fn test_failure_with_fallback_keeps_data() {
    let mut state: FetchState<u32> = FetchState::default();
    state.apply(FetchOutcome::Failed {
      error: "failed to fetch data".to_string(),
      fallback: Some(CacheEntry::new(vec![4, 5], None)),
    });
    assert_eq!(state.data, vec![4, 5]);
    assert_eq!(state.source, Some(DataSource::StaleCache));
    assert_eq!(state.status(), FetchStatus::Failed);
  }

  #[test]
  fn test_unauthorized_keeps_data() {
    let mut state: FetchState<u32> = FetchState::default();
    state.apply(FetchOutcome::Fetched(CacheEntry::new(vec![1], None)));
    state.apply(FetchOutcome::Unauthorized);
    assert_eq!(state.data, vec![1]);
    assert!(state.error.is_some());
  }

  #[tokio::test]
  async fn test_cache_hit_settles_synchronously() {
    let server = MockServer::start().await;
    let (fetcher, cache, _session) = setup(&server);
    let key = cache.storage_key(SuratMasuk::CACHE_KEY, &Credential::new(TOKEN));
    cache.write(&key, &CacheEntry::<SuratMasuk>::new(Vec::new(), None));

    let mut query = ListQuery::new(fetcher, Duration::ZERO);
    query.fetch();

    assert!(!query.is_loading());
    assert_eq!(query.state().source, Some(DataSource::Cache));
  }

  #[tokio::test]
  async fn test_loading_until_fetch_lands() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/surat-masuk"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(list_body(&["A1"]))
          .set_delay(Duration::from_millis(50)),
      )
      .mount(&server)
      .await;
    let (fetcher, _cache, _session) = setup(&server);

    let mut query = ListQuery::new(fetcher, Duration::ZERO);
    query.start();
    assert!(query.is_loading());
    assert_eq!(query.state().status(), FetchStatus::Loading);

    settle(&mut query).await;
    assert_eq!(query.data().len(), 1);
    assert_eq!(query.state().status(), FetchStatus::Ready);
  }

  #[tokio::test]
  async fn test_superseded_fetch_is_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/surat-masuk"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(list_body(&["OLD"]))
          .set_delay(Duration::from_millis(150)),
      )
      .up_to_n_times(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/surat-masuk"))
      .respond_with(ResponseTemplate::new(200).set_body_json(list_body(&["NEW"])))
      .mount(&server)
      .await;
    let (fetcher, _cache, _session) = setup(&server);

    let mut query = ListQuery::new(fetcher, Duration::ZERO);
    query.refetch();
    tokio::time::sleep(Duration::from_millis(20)).await;
    query.refetch();

    settle(&mut query).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    query.poll();

    assert_eq!(query.data()[0].id(), "NEW");
  }

  #[tokio::test]
  async fn test_periodic_refresh_forces_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/surat-masuk"))
      .respond_with(ResponseTemplate::new(200).set_body_json(list_body(&["A1"])))
      .expect(2..)
      .mount(&server)
      .await;
    let (fetcher, _cache, _session) = setup(&server);

    let mut query = ListQuery::new(fetcher, Duration::from_millis(60));
    query.start();
    settle(&mut query).await;

    // The cache is fresh now, so only the timer can cause another request
    tokio::time::sleep(Duration::from_millis(100)).await;
    query.poll();
    settle(&mut query).await;
  }

  #[tokio::test]
  async fn test_delete_refreshes_state() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/api/surat-masuk/A1"))
      .respond_with(ResponseTemplate::new(200))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/surat-masuk"))
      .respond_with(ResponseTemplate::new(200).set_body_json(list_body(&["A2"])))
      .mount(&server)
      .await;
    let (fetcher, _cache, _session) = setup(&server);

    let mut query = ListQuery::new(fetcher, Duration::ZERO);
    query.delete("A1".to_string()).unwrap();
    assert_eq!(query.mutation(), &MutationStatus::Submitting(MutationKind::Delete));

    settle(&mut query).await;
    assert_eq!(
      query.take_mutation(),
      Some(MutationStatus::Succeeded(MutationKind::Delete))
    );
    assert_eq!(query.mutation(), &MutationStatus::Idle);
    assert_eq!(query.data()[0].id(), "A2");
  }

  #[tokio::test]
  async fn test_add_refused_while_delete_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/api/surat-masuk/A1"))
      .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/api/surat-masuk"))
      .respond_with(ResponseTemplate::new(201))
      .expect(0)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/surat-masuk"))
      .respond_with(ResponseTemplate::new(200).set_body_json(list_body(&["A2"])))
      .mount(&server)
      .await;
    let (fetcher, _cache, _session) = setup(&server);

    let mut query = ListQuery::new(fetcher, Duration::ZERO);
    query.delete("A1".to_string()).unwrap();

    let entry = NewEntry::new().with("no_surat_masuk", "SM-1");
    assert_eq!(query.add(entry), Err(MutationError::Busy));
    assert_eq!(query.mutation(), &MutationStatus::Submitting(MutationKind::Delete));

    settle(&mut query).await;
    assert_eq!(
      query.take_mutation(),
      Some(MutationStatus::Succeeded(MutationKind::Delete))
    );
  }

  #[tokio::test]
  async fn test_unauthorized_marks_signed_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/surat-masuk"))
      .respond_with(ResponseTemplate::new(401))
      .mount(&server)
      .await;
    let (fetcher, _cache, session) = setup(&server);

    let mut query = ListQuery::new(fetcher, Duration::ZERO);
    query.fetch();
    settle(&mut query).await;

    assert!(query.signed_out());
    assert!(!session.is_authenticated());
  }
}
