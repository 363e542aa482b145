//! Correspondence records and the resources that serve them.

mod entry;
mod format;
mod notulen;
mod surat_keluar;
mod surat_masuk;

pub use entry::{EntryError, NewEntry};
pub use format::{format_id_date, format_long_date};
pub use notulen::Notulen;
pub use surat_keluar::SuratKeluar;
pub use surat_masuk::SuratMasuk;

use serde::{de::DeserializeOwned, Serialize};

/// Cache keys of every list resource.
pub const CACHE_KEYS: &[&str] = &[SuratMasuk::CACHE_KEY, SuratKeluar::CACHE_KEY, Notulen::CACHE_KEY];

/// A list column.
#[derive(Debug, Clone, Copy)]
pub struct Column {
  pub title: &'static str,
  pub width: u16,
}

impl Column {
  pub const fn new(title: &'static str, width: u16) -> Self {
    Self { title, width }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  Text,
  /// `YYYY-MM-DD`
  Date,
  /// Local file path to upload
  Attachment,
}

/// A field of the add-entry form.
#[derive(Debug, Clone, Copy)]
pub struct FormField {
  /// Name sent to the server
  pub name: &'static str,
  pub label: &'static str,
  pub required: bool,
  pub kind: FieldKind,
}

impl FormField {
  pub const fn text(name: &'static str, label: &'static str) -> Self {
    Self {
      name,
      label,
      required: true,
      kind: FieldKind::Text,
    }
  }

  pub const fn date(name: &'static str, label: &'static str) -> Self {
    Self {
      name,
      label,
      required: true,
      kind: FieldKind::Date,
    }
  }

  pub const fn attachment(name: &'static str, label: &'static str) -> Self {
    Self {
      name,
      label,
      required: false,
      kind: FieldKind::Attachment,
    }
  }

  pub const fn optional(mut self) -> Self {
    self.required = false;
    self
  }
}

/// A list resource served by the E-Filing API.
///
/// Implementors are the record type as shown and cached; `Raw` is the wire
/// shape it is mapped from.
pub trait Resource: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  type Raw: DeserializeOwned + Send + 'static;

  /// Path under `api/` (e.g. "surat-masuk")
  const PATH: &'static str;

  /// Fixed cache key for this resource's list
  const CACHE_KEY: &'static str;

  /// Display name
  const TITLE: &'static str;

  /// Whether `GET api/{PATH}/{id}` exists
  const HAS_DETAIL_ENDPOINT: bool = true;

  /// Submit create requests as multipart even without an attachment
  const ALWAYS_MULTIPART: bool = false;

  fn from_raw(raw: Self::Raw) -> Self;

  /// Server-assigned identifier used for detail and delete.
  fn id(&self) -> &str;

  fn columns() -> &'static [Column];

  /// One cell per column.
  fn cells(&self) -> Vec<String>;

  /// Every displayed field as (label, value).
  fn fields(&self) -> Vec<(&'static str, &str)>;

  /// Stored document URL, if one is attached.
  fn document(&self) -> Option<&str> {
    None
  }

  /// Add-entry form; empty means the resource cannot be created here.
  fn form_fields() -> &'static [FormField] {
    &[]
  }

  /// Case-insensitive substring match over every displayed field.
  fn matches(&self, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
      return true;
    }
    self
      .fields()
      .iter()
      .any(|(_, value)| value.to_lowercase().contains(&query))
  }
}
