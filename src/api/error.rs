//! Errors raised by the API client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  /// No credential is stored; nothing was sent.
  #[error("credential not found")]
  MissingCredential,

  /// The server rejected the credential (HTTP 401).
  #[error("credential rejected by server")]
  Unauthorized,

  /// Any other non-success status.
  #[error("server responded with status {status}")]
  Status {
    status: u16,
    message: Option<String>,
  },

  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("failed to decode response: {0}")]
  Decode(String),

  /// A 2xx response without the expected `data.paginatedData` payload.
  #[error("unrecognized response envelope")]
  UnexpectedEnvelope { message: Option<String> },

  #[error("invalid request url: {0}")]
  Url(String),
}

impl ApiError {
  pub fn is_unauthorized(&self) -> bool {
    matches!(self, ApiError::Unauthorized)
  }

  /// Message supplied by the server, if any.
  pub fn server_message(&self) -> Option<&str> {
    match self {
      ApiError::Status {
        message: Some(message),
        ..
      }
      | ApiError::UnexpectedEnvelope {
        message: Some(message),
      } if !message.trim().is_empty() => Some(message),
      _ => None,
    }
  }

  /// Whether the failure happened on the wire (HTTP status or transport)
  /// rather than while interpreting a response.
  pub fn is_http_failure(&self) -> bool {
    matches!(
      self,
      ApiError::Unauthorized | ApiError::Status { .. } | ApiError::Transport(_)
    )
  }

  /// Human-readable message: the server's own if present, else `fallback`.
  pub fn user_message(&self, fallback: &str) -> String {
    self
      .server_message()
      .map(String::from)
      .unwrap_or_else(|| fallback.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_user_message_prefers_server_message() {
    let err = ApiError::Status {
      status: 422,
      message: Some("Nomor surat sudah ada".to_string()),
    };
    assert_eq!(err.user_message("failed to add entry"), "Nomor surat sudah ada");
  }

  #[test]
  fn test_user_message_fallback() {
    let blank = ApiError::Status {
      status: 500,
      message: Some("  ".to_string()),
    };
    assert_eq!(blank.user_message("failed to fetch data"), "failed to fetch data");
    assert_eq!(
      ApiError::UnexpectedEnvelope { message: None }.user_message("failed to fetch data"),
      "failed to fetch data"
    );
  }

  #[test]
  fn test_envelope_message_is_surfaced() {
    let err = ApiError::UnexpectedEnvelope {
      message: Some("Data surat tidak tersedia".to_string()),
    };
    assert_eq!(err.user_message("failed to fetch data"), "Data surat tidak tersedia");
  }

  #[test]
  fn test_classification() {
    assert!(ApiError::Unauthorized.is_unauthorized());
    assert!(ApiError::Unauthorized.is_http_failure());
    assert!(!ApiError::Decode("eof".to_string()).is_http_failure());
  }
}
