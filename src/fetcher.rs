//! Cached list fetcher.
//!
//! Serves a resource's list from the cache while it is fresh, goes to the
//! network otherwise, and falls back to whatever is cached when the network
//! fails. Mutations invalidate the cached list and refetch it before
//! reporting success.

use std::marker::PhantomData;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, EfilingClient};
use crate::cache::{CacheEntry, ListCache};
use crate::records::{EntryError, NewEntry, Resource};
use crate::session::{Credential, Session};

pub const MISSING_CREDENTIAL: &str = "credential not found";
const FETCH_FAILED: &str = "failed to fetch data";
const UNEXPECTED_FAILURE: &str = "unexpected error while fetching data";
const ADD_FAILED: &str = "failed to add entry";
const DELETE_FAILED: &str = "failed to delete entry";

/// Result of one fetch attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<R> {
  /// Fresh cache entry, no request was made.
  CacheHit(CacheEntry<R>),
  /// Fetched from the server and written to the cache.
  Fetched(CacheEntry<R>),
  /// Request failed; `fallback` is the cached entry regardless of age.
  Failed {
    error: String,
    fallback: Option<CacheEntry<R>>,
  },
  /// Server rejected the credential. The session has been cleared.
  Unauthorized,
  /// No credential stored. Nothing was sent.
  MissingCredential,
}

impl<R> FetchOutcome<R> {
  pub fn is_unauthorized(&self) -> bool {
    matches!(self, FetchOutcome::Unauthorized)
  }
}

/// What `fetch_data` will do, decided without any I/O.
#[derive(Debug)]
pub enum FetchPlan<R> {
  /// Settled synchronously (cache hit or missing credential).
  Ready(FetchOutcome<R>),
  /// A request is needed with this credential.
  Network(Credential),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MutationError {
  #[error("credential not found")]
  MissingCredential,

  /// The session has been cleared.
  #[error("session expired, sign in again")]
  Unauthorized,

  #[error("{message}")]
  Rejected { message: String },

  #[error(transparent)]
  InvalidEntry(#[from] EntryError),

  /// Another add or delete on the same list has not finished yet.
  #[error("another change is in progress")]
  Busy,
}

/// Fetches and mutates one resource's list.
pub struct ListFetcher<R> {
  client: EfilingClient,
  cache: ListCache,
  session: Session,
  _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ListFetcher<R> {
  fn clone(&self) -> Self {
    Self {
      client: self.client.clone(),
      cache: self.cache.clone(),
      session: self.session.clone(),
      _resource: PhantomData,
    }
  }
}

impl<R: Resource> ListFetcher<R> {
  pub fn new(client: EfilingClient, cache: ListCache, session: Session) -> Self {
    Self {
      client,
      cache,
      session,
      _resource: PhantomData,
    }
  }

  pub fn client(&self) -> &EfilingClient {
    &self.client
  }

  pub fn cache(&self) -> &ListCache {
    &self.cache
  }

  fn cache_key(&self, credential: &Credential) -> String {
    self.cache.storage_key(R::CACHE_KEY, credential)
  }

  /// Credential check and cache fast path.
  pub fn plan(&self, force: bool) -> FetchPlan<R> {
    let Some(credential) = self.session.credential() else {
      warn!(resource = R::PATH, "no credential, not fetching");
      return FetchPlan::Ready(FetchOutcome::MissingCredential);
    };

    if !force {
      if let Some(entry) = self.cache.read_fresh::<R>(&self.cache_key(&credential)) {
        debug!(resource = R::PATH, records = entry.data.len(), "cache hit");
        return FetchPlan::Ready(FetchOutcome::CacheHit(entry));
      }
    }

    FetchPlan::Network(credential)
  }

  /// Fetch the list from the server, bypassing the cache.
  #[instrument(skip_all, fields(resource = R::PATH))]
  pub async fn fetch_remote(&self, credential: &Credential) -> FetchOutcome<R> {
    let key = self.cache_key(credential);

    match self.client.list::<R::Raw>(R::PATH, credential).await {
      Ok(page) => {
        let data: Vec<R> = page.records.into_iter().map(R::from_raw).collect();
        info!(records = data.len(), "fetched list");
        let entry = CacheEntry::new(data, page.pagination);
        self.cache.write(&key, &entry);
        FetchOutcome::Fetched(entry)
      }
      Err(e) if e.is_unauthorized() => {
        warn!("credential rejected, signing out");
        self.session.clear();
        FetchOutcome::Unauthorized
      }
      Err(e) => {
        let fallback_message = if e.is_http_failure() {
          FETCH_FAILED
        } else {
          UNEXPECTED_FAILURE
        };
        let fallback = self.cache.read::<R>(&key);
        warn!(error = %e, has_fallback = fallback.is_some(), "fetch failed");
        FetchOutcome::Failed {
          error: e.user_message(fallback_message),
          fallback,
        }
      }
    }
  }

  /// Serve from a fresh cache entry unless `force`, else fetch.
  pub async fn fetch_data(&self, force: bool) -> FetchOutcome<R> {
    match self.plan(force) {
      FetchPlan::Ready(outcome) => outcome,
      FetchPlan::Network(credential) => self.fetch_remote(&credential).await,
    }
  }

  /// Create a record, then invalidate and refetch the list.
  #[instrument(skip_all, fields(resource = R::PATH))]
  pub async fn add_entry(&self, entry: NewEntry) -> Result<FetchOutcome<R>, MutationError> {
    let credential = self.session.credential().ok_or(MutationError::MissingCredential)?;
    let body = entry.into_body::<R>().await?;

    self
      .client
      .create(R::PATH, body, &credential)
      .await
      .map_err(|e| self.rejected(e, ADD_FAILED))?;

    info!("entry added");
    Ok(self.refresh_after_mutation(&credential).await)
  }

  /// Delete a record by id, then invalidate and refetch the list.
  #[instrument(skip(self), fields(resource = R::PATH))]
  pub async fn delete_entry(&self, id: &str) -> Result<FetchOutcome<R>, MutationError> {
    let credential = self.session.credential().ok_or(MutationError::MissingCredential)?;

    self
      .client
      .delete(R::PATH, id, &credential)
      .await
      .map_err(|e| self.rejected(e, DELETE_FAILED))?;

    info!("entry deleted");
    Ok(self.refresh_after_mutation(&credential).await)
  }

  /// Fetch a single record through the detail endpoint. Not cached.
  ///
  /// Only meaningful when `R::HAS_DETAIL_ENDPOINT` is set.
  #[instrument(skip(self), fields(resource = R::PATH))]
  pub async fn fetch_one(&self, id: &str) -> Result<R, ApiError> {
    let credential = self.session.credential().ok_or(ApiError::MissingCredential)?;

    match self.client.get_one::<R::Raw>(R::PATH, id, &credential).await {
      Ok(raw) => Ok(R::from_raw(raw)),
      Err(e) => {
        if e.is_unauthorized() {
          warn!("credential rejected, signing out");
          self.session.clear();
        }
        Err(e)
      }
    }
  }

  async fn refresh_after_mutation(&self, credential: &Credential) -> FetchOutcome<R> {
    self.cache.invalidate(&self.cache_key(credential));
    self.fetch_remote(credential).await
  }

  fn rejected(&self, error: ApiError, fallback: &str) -> MutationError {
    if error.is_unauthorized() {
      warn!("credential rejected, signing out");
      self.session.clear();
      return MutationError::Unauthorized;
    }
    warn!(error = %error, "mutation failed");
    MutationError::Rejected {
      message: error.user_message(fallback),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::PaginationMeta;
  use crate::records::SuratMasuk;
  use crate::store::{PersistedStore, SqliteStore};
  use chrono::{Duration, Utc};
  use serde_json::{json, Value};
  use wiremock::matchers::{header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  const TOKEN: &str = "secret-token";

  struct Fixture {
    fetcher: ListFetcher<SuratMasuk>,
    cache: ListCache,
    session: Session,
  }

  fn fixture(server: &MockServer) -> Fixture {
    let store = PersistedStore::new(SqliteStore::in_memory().unwrap());
    let session = Session::new(store.clone());
    session.login(TOKEN);
    let cache = ListCache::new(store, crate::cache::DEFAULT_TTL);
    let client = EfilingClient::new(&server.uri()).unwrap();
    Fixture {
      fetcher: ListFetcher::new(client, cache.clone(), session.clone()),
      cache,
      session,
    }
  }

  fn surat(id: &str) -> SuratMasuk {
    SuratMasuk {
      nomor_surat: id.to_string(),
      tanggal_surat: "1/7/2024".to_string(),
      perihal: "Undangan".to_string(),
      tujuan_surat: "Lab".to_string(),
      organisasi: "HIMA".to_string(),
      pengirim: "Ketua".to_string(),
      penerima: "Kalab".to_string(),
      sifat_surat: String::new(),
      kategori: String::new(),
      alamat: String::new(),
      diteruskan_kepada: String::new(),
      isi_disposisi: String::new(),
      scan_surat: None,
    }
  }

  fn list_body(ids: &[&str]) -> Value {
    let records: Vec<Value> = ids
      .iter()
      .map(|id| {
        json!({
          "no_surat_masuk": id,
          "tanggal": "2024-07-01T00:00:00.000Z",
          "perihal": "Undangan",
          "tujuan": "Lab",
          "organisasi": "HIMA",
          "pengirim": "Ketua",
          "penerima": "Kalab"
        })
      })
      .collect();

    json!({
      "status": 200,
      "message": "OK",
      "data": {
        "paginatedData": records,
        "meta": { "currentPage": 1, "itemsPerPage": 10, "totalItems": ids.len(), "totalPages": 1 }
      }
    })
  }

  fn seed(fx: &Fixture, records: Vec<SuratMasuk>, age_ms: i64) {
    let key = fx.cache.storage_key(SuratMasuk::CACHE_KEY, &Credential::new(TOKEN));
    let entry = CacheEntry::written_at(records, None, Utc::now() - Duration::milliseconds(age_ms));
    fx.cache.write(&key, &entry);
  }

  fn cached(fx: &Fixture) -> Option<CacheEntry<SuratMasuk>> {
    let key = fx.cache.storage_key(SuratMasuk::CACHE_KEY, &Credential::new(TOKEN));
    fx.cache.read(&key)
  }

  async fn mount_list(server: &MockServer, ids: &[&str], calls: u64) {
    Mock::given(method("GET"))
      .and(path("/api/surat-masuk"))
      .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
      .respond_with(ResponseTemplate::new(200).set_body_json(list_body(ids)))
      .expect(calls)
      .mount(server)
      .await;
  }

  #[tokio::test]
  async fn test_empty_store_fetches_and_writes_cache() {
    let server = MockServer::start().await;
    mount_list(&server, &["A1", "A2"], 1).await;
    let fx = fixture(&server);

    let outcome = fx.fetcher.fetch_data(false).await;

    let FetchOutcome::Fetched(entry) = outcome else {
      panic!("expected a network fetch, got {:?}", outcome);
    };
    assert_eq!(entry.data.len(), 2);
    assert_eq!(entry.data[0].tanggal_surat, "1/7/2024");
    assert_eq!(entry.pagination.as_ref().map(|p| p.total_items), Some(2));
    assert!(entry.age_at(Utc::now()) < Duration::seconds(5));
    assert_eq!(cached(&fx), Some(entry));
  }

  #[tokio::test]
  async fn test_fresh_cache_skips_network() {
    let server = MockServer::start().await;
    mount_list(&server, &["B1"], 0).await;
    let fx = fixture(&server);
    seed(&fx, vec![surat("X")], 60_000);

    let outcome = fx.fetcher.fetch_data(false).await;

    let FetchOutcome::CacheHit(entry) = outcome else {
      panic!("expected a cache hit, got {:?}", outcome);
    };
    assert_eq!(entry.data, vec![surat("X")]);
  }

  #[tokio::test]
  async fn test_stale_cache_fetches() {
    let server = MockServer::start().await;
    mount_list(&server, &["B1"], 1).await;
    let fx = fixture(&server);
    seed(&fx, vec![surat("X")], 300_000);

    let outcome = fx.fetcher.fetch_data(false).await;
    assert!(matches!(outcome, FetchOutcome::Fetched(_)));
  }

  #[tokio::test]
  async fn test_forced_fetch_ignores_fresh_cache() {
    let server = MockServer::start().await;
    mount_list(&server, &["B1"], 1).await;
    let fx = fixture(&server);
    seed(&fx, vec![surat("X")], 1_000);

    let outcome = fx.fetcher.fetch_data(true).await;

    let FetchOutcome::Fetched(entry) = outcome else {
      panic!("expected a network fetch, got {:?}", outcome);
    };
    assert_eq!(entry.data[0].nomor_surat, "B1");
  }

  #[tokio::test]
  async fn test_failure_falls_back_to_stale_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/surat-masuk"))
      .respond_with(ResponseTemplate::new(500))
      .expect(1)
      .mount(&server)
      .await;
    let fx = fixture(&server);
    seed(&fx, vec![surat("X")], 400_000);

    let outcome = fx.fetcher.fetch_data(false).await;

    let FetchOutcome::Failed { error, fallback } = outcome else {
      panic!("expected a failure, got {:?}", outcome);
    };
    assert_eq!(error, FETCH_FAILED);
    assert_eq!(fallback.map(|e| e.data), Some(vec![surat("X")]));
  }

  #[tokio::test]
  async fn test_failure_prefers_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/surat-masuk"))
      .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "message": "maintenance" })))
      .mount(&server)
      .await;
    let fx = fixture(&server);
    seed(&fx, vec![surat("X")], 600_000);

    let outcome = fx.fetcher.fetch_data(true).await;

    let FetchOutcome::Failed { error, fallback } = outcome else {
      panic!("expected a failure, got {:?}", outcome);
    };
    assert_eq!(error, "maintenance");
    assert!(fallback.is_some());
  }

  #[tokio::test]
  async fn test_unrecognized_envelope_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/surat-masuk"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": 200, "data": {} })))
      .mount(&server)
      .await;
    let fx = fixture(&server);

    let outcome = fx.fetcher.fetch_data(false).await;

    assert_eq!(
      outcome,
      FetchOutcome::Failed {
        error: UNEXPECTED_FAILURE.to_string(),
        fallback: None,
      }
    );
  }

  #[tokio::test]
  async fn test_envelope_without_data_reports_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/surat-masuk"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "status": 200, "message": "Belum ada data" })),
      )
      .mount(&server)
      .await;
    let fx = fixture(&server);

    let outcome = fx.fetcher.fetch_data(false).await;

    assert_eq!(
      outcome,
      FetchOutcome::Failed {
        error: "Belum ada data".to_string(),
        fallback: None,
      }
    );
  }

  #[tokio::test]
  async fn test_unauthorized_clears_session_without_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/surat-masuk"))
      .respond_with(ResponseTemplate::new(401))
      .expect(1)
      .mount(&server)
      .await;
    let fx = fixture(&server);
    seed(&fx, vec![surat("X")], 400_000);

    let outcome = fx.fetcher.fetch_data(false).await;

    assert_eq!(outcome, FetchOutcome::Unauthorized);
    assert!(!fx.session.is_authenticated());
  }

  #[tokio::test]
  async fn test_missing_credential_sends_nothing() {
    let server = MockServer::start().await;
    mount_list(&server, &["A1"], 0).await;
    let fx = fixture(&server);
    fx.session.clear();

    assert_eq!(fx.fetcher.fetch_data(true).await, FetchOutcome::MissingCredential);
    assert_eq!(
      fx.fetcher.delete_entry("A1").await,
      Err(MutationError::MissingCredential)
    );
    assert_eq!(MutationError::MissingCredential.to_string(), MISSING_CREDENTIAL);
  }

  #[tokio::test]
  async fn test_delete_invalidates_then_refetches_once() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/api/surat-masuk/A1"))
      .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": 200 })))
      .expect(1)
      .mount(&server)
      .await;
    mount_list(&server, &["A2"], 1).await;
    let fx = fixture(&server);
    seed(&fx, vec![surat("A1"), surat("A2")], 1_000);

    let outcome = fx.fetcher.delete_entry("A1").await.unwrap();

    let FetchOutcome::Fetched(entry) = outcome else {
      panic!("expected a refetch, got {:?}", outcome);
    };
    let ids: Vec<&str> = entry.data.iter().map(|s| s.id()).collect();
    assert_eq!(ids, vec!["A2"]);
    assert_eq!(cached(&fx).map(|e| e.data.len()), Some(1));
  }

  #[tokio::test]
  async fn test_delete_removes_cache_even_when_refetch_fails() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/api/surat-masuk/A1"))
      .respond_with(ResponseTemplate::new(200))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/surat-masuk"))
      .respond_with(ResponseTemplate::new(500))
      .expect(1)
      .mount(&server)
      .await;
    let fx = fixture(&server);
    seed(&fx, vec![surat("A1"), surat("A2")], 1_000);

    let outcome = fx.fetcher.delete_entry("A1").await.unwrap();

    assert!(
      matches!(outcome, FetchOutcome::Failed { fallback: None, .. }),
      "pre-delete entry must not be served, got {:?}",
      outcome
    );
    assert_eq!(cached(&fx), None);
  }

  #[tokio::test]
  async fn test_failed_delete_keeps_cache() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/api/surat-masuk/A1"))
      .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Surat tidak ditemukan" })))
      .mount(&server)
      .await;
    mount_list(&server, &[], 0).await;
    let fx = fixture(&server);
    seed(&fx, vec![surat("A1")], 1_000);

    let result = fx.fetcher.delete_entry("A1").await;

    assert_eq!(
      result,
      Err(MutationError::Rejected {
        message: "Surat tidak ditemukan".to_string()
      })
    );
    assert_eq!(cached(&fx).map(|e| e.data), Some(vec![surat("A1")]));
  }

  #[tokio::test]
  async fn test_add_entry_posts_then_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/surat-masuk"))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "status": 201 })))
      .expect(1)
      .mount(&server)
      .await;
    mount_list(&server, &["A1", "NEW"], 1).await;
    let fx = fixture(&server);
    seed(&fx, vec![surat("A1")], 1_000);

    let entry = NewEntry::new()
      .with("no_surat_masuk", "NEW")
      .with("tanggal", "2024-07-01")
      .with("perihal", "Undangan")
      .with("organisasi", "HIMA")
      .with("tujuan", "Lab")
      .with("pengirim", "Ketua")
      .with("penerima", "Kalab");

    let outcome = fx.fetcher.add_entry(entry).await.unwrap();

    let FetchOutcome::Fetched(entry) = outcome else {
      panic!("expected a refetch, got {:?}", outcome);
    };
    assert_eq!(entry.data.len(), 2);
  }

  #[tokio::test]
  async fn test_add_entry_rejects_invalid_form_without_io() {
    let server = MockServer::start().await;
    mount_list(&server, &[], 0).await;
    let fx = fixture(&server);

    let result = fx.fetcher.add_entry(NewEntry::new()).await;

    assert_eq!(
      result,
      Err(MutationError::InvalidEntry(EntryError::Missing("Nomor Surat")))
    );
  }

  #[tokio::test]
  async fn test_add_entry_unauthorized_signs_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/surat-masuk"))
      .respond_with(ResponseTemplate::new(401))
      .mount(&server)
      .await;
    let fx = fixture(&server);

    let entry = NewEntry::new()
      .with("no_surat_masuk", "NEW")
      .with("tanggal", "2024-07-01")
      .with("perihal", "Undangan")
      .with("organisasi", "HIMA")
      .with("tujuan", "Lab")
      .with("pengirim", "Ketua")
      .with("penerima", "Kalab");

    assert_eq!(fx.fetcher.add_entry(entry).await, Err(MutationError::Unauthorized));
    assert!(!fx.session.is_authenticated());
  }

  #[tokio::test]
  async fn test_fetch_one_escapes_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/surat-masuk/H%2FUBL%2F010"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "status": 200,
        "data": {
          "no_surat_masuk": "H/UBL/010",
          "tanggal": "2024-02-29",
          "perihal": "Peminjaman Ruang"
        }
      })))
      .expect(1)
      .mount(&server)
      .await;
    let fx = fixture(&server);

    let surat = fx.fetcher.fetch_one("H/UBL/010").await.unwrap();
    assert_eq!(surat.id(), "H/UBL/010");
    assert_eq!(surat.tanggal_surat, "29/2/2024");
  }

  #[tokio::test]
  async fn test_per_account_keys_do_not_leak() {
    let server = MockServer::start().await;
    mount_list(&server, &["OTHER"], 1).await;
    let mut fx = fixture(&server);
    fx.cache = fx.cache.clone().with_per_account(true);
    fx.fetcher = ListFetcher::new(fx.fetcher.client().clone(), fx.cache.clone(), fx.session.clone());

    // Fresh entry written for a different account
    let other = Credential::new("someone-else");
    let key = fx.cache.storage_key(SuratMasuk::CACHE_KEY, &other);
    fx.cache.write(&key, &CacheEntry::new(vec![surat("X")], Some(PaginationMeta::default())));

    let outcome = fx.fetcher.fetch_data(false).await;
    assert!(matches!(outcome, FetchOutcome::Fetched(_)));
  }
}
