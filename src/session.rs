//! Bearer credential persisted across runs.

use sha2::{Digest, Sha256};
use std::fmt;
use tracing::info;

use crate::store::PersistedStore;

/// Store key for the bearer token.
const TOKEN_KEY: &str = "token";

/// A bearer token attached to every API request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
  pub fn new(token: impl Into<String>) -> Self {
    Self(token.into())
  }

  pub fn token(&self) -> &str {
    &self.0
  }

  /// Short stable hash identifying the account behind this token.
  pub fn account_hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.0.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
  }
}

impl fmt::Debug for Credential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Credential").field(&"<redacted>").finish()
  }
}

/// Session state backed by the persisted store.
#[derive(Clone)]
pub struct Session {
  store: PersistedStore,
}

impl Session {
  pub fn new(store: PersistedStore) -> Self {
    Self { store }
  }

  /// The stored credential, if any.
  pub fn credential(&self) -> Option<Credential> {
    self
      .store
      .get::<String>(TOKEN_KEY)
      .filter(|token| !token.trim().is_empty())
      .map(Credential::new)
  }

  pub fn is_authenticated(&self) -> bool {
    self.credential().is_some()
  }

  /// Store `token` as the active credential. Blank tokens are ignored.
  pub fn login(&self, token: &str) -> bool {
    let token = token.trim();
    if token.is_empty() {
      return false;
    }
    self.store.set(TOKEN_KEY, &token);
    info!("credential stored");
    true
  }

  /// Forget the stored credential.
  pub fn clear(&self) {
    self.store.remove(TOKEN_KEY);
    info!("credential cleared");
  }
}
