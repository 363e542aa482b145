//! Serde types matching E-Filing API payloads.
//!
//! These types are separate from the record types in `crate::records` so the
//! wire shape can drift without touching what the UI and cache store.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::ApiError;

/// Deserialize a string field that the server may send as a string, a
/// number, or null.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  let value: Option<Value> = Option::deserialize(deserializer)?;
  Ok(match value {
    None | Some(Value::Null) => String::new(),
    Some(Value::String(s)) => s,
    Some(other) => other.to_string(),
  })
}

// ============================================================================
// Envelopes
// ============================================================================

/// Top-level response wrapper: `{ status, message, data }`. Only `data`
/// and `message` are read.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
  #[serde(default)]
  pub message: Option<String>,
  pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
  /// The payload, or `UnexpectedEnvelope` carrying the server's message.
  pub fn into_data(self) -> Result<T, ApiError> {
    self.data.ok_or(ApiError::UnexpectedEnvelope {
      message: self.message.filter(|m| !m.trim().is_empty()),
    })
  }
}

/// Payload of a list endpoint: `{ paginatedData, meta }`.
#[derive(Debug, Deserialize)]
pub struct ApiPaginated<T> {
  #[serde(rename = "paginatedData")]
  pub paginated_data: Option<Vec<T>>,
  #[serde(default)]
  pub meta: Option<PaginationMeta>,
}

/// Error body returned alongside non-2xx statuses.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
  #[serde(default)]
  pub message: Option<String>,
}

/// Pagination metadata as reported by the server.
///
/// Unknown keys are preserved so the cache round-trips whatever the server sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaginationMeta {
  #[serde(rename = "currentPage", default)]
  pub current_page: u64,
  #[serde(rename = "itemsPerPage", default)]
  pub items_per_page: u64,
  #[serde(rename = "totalItems", default)]
  pub total_items: u64,
  #[serde(rename = "totalPages", default)]
  pub total_pages: u64,
  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

/// One page of raw records from a list endpoint.
#[derive(Debug)]
pub struct ListPage<T> {
  pub records: Vec<T>,
  pub pagination: Option<PaginationMeta>,
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ApiSuratMasuk {
  #[serde(default, deserialize_with = "lenient_string")]
  pub no_surat_masuk: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub tanggal: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub perihal: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub tujuan: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub organisasi: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub pengirim: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub penerima: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub sifat_surat: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub kategori: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub alamat: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub diteruskan_kepada: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub isi_disposisi: String,
  #[serde(default)]
  pub scan_surat: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiSuratKeluar {
  #[serde(default, deserialize_with = "lenient_string")]
  pub id: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub surat_nomor: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub tanggal: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub tempat_surat: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub lampiran: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub isi_surat: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub penerima: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub pengirim: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub jabatan_pengirim: String,
  #[serde(default)]
  pub gambar: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub keterangan_gambar: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub sifat_surat: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiNotulen {
  #[serde(default, deserialize_with = "lenient_string")]
  pub id: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub tanggal_rapat: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub lokasi: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub agenda: String,
  #[serde(default)]
  pub dokumen_lampiran: Option<String>,
}

// ============================================================================
// Request bodies
// ============================================================================

/// A file to upload with a create request.
#[derive(Debug, Clone)]
pub struct Attachment {
  /// Multipart field name (e.g. "scan_surat")
  pub field: String,
  pub file_name: String,
  pub mime: String,
  pub bytes: Vec<u8>,
}

/// Body of a create request.
#[derive(Debug, Clone)]
pub enum EntryBody {
  Json(serde_json::Map<String, Value>),
  Multipart {
    fields: Vec<(String, String)>,
    attachment: Option<Attachment>,
  },
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_list_envelope_parses() {
    let body = json!({
      "status": 200,
      "message": "ok",
      "data": {
        "paginatedData": [{ "id": "K1", "surat_nomor": "001/SK/2024" }],
        "meta": { "currentPage": 1, "itemsPerPage": 10, "totalItems": 1, "totalPages": 1, "hasNext": false }
      }
    });

    let envelope: ApiEnvelope<ApiPaginated<ApiSuratKeluar>> = serde_json::from_value(body).unwrap();
    let data = envelope.data.unwrap();
    let records = data.paginated_data.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].surat_nomor, "001/SK/2024");

    let meta = data.meta.unwrap();
    assert_eq!(meta.total_items, 1);
    assert_eq!(meta.extra.get("hasNext"), Some(&json!(false)));
  }

  #[test]
  fn test_missing_paginated_data_is_none() {
    let body = json!({ "status": 200, "data": { "items": [] } });
    let envelope: ApiEnvelope<ApiPaginated<ApiNotulen>> = serde_json::from_value(body).unwrap();
    assert!(envelope.data.unwrap().paginated_data.is_none());
  }

  #[test]
  fn test_lenient_strings() {
    let raw: ApiSuratMasuk = serde_json::from_value(json!({
      "no_surat_masuk": 42,
      "perihal": null,
      "tujuan": "Rektorat"
    }))
    .unwrap();

    assert_eq!(raw.no_surat_masuk, "42");
    assert_eq!(raw.perihal, "");
    assert_eq!(raw.tujuan, "Rektorat");
    assert_eq!(raw.pengirim, "");
    assert!(raw.scan_surat.is_none());
  }
}
