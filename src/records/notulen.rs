use serde::{Deserialize, Serialize};

use super::{format_id_date, Column, Resource};
use crate::api::types::ApiNotulen;

/// Meeting minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notulen {
  pub id: String,
  pub tanggal: String,
  pub tempat: String,
  pub agenda: String,
  pub hasil: Option<String>,
}

const COLUMNS: &[Column] = &[
  Column::new("Tanggal", 12),
  Column::new("Tempat", 20),
  Column::new("Agenda", 36),
  Column::new("Hasil", 24),
];

impl Resource for Notulen {
  type Raw = ApiNotulen;

  const PATH: &'static str = "notulen";
  const CACHE_KEY: &'static str = "notulen_cache";
  const TITLE: &'static str = "Notulen";
  const HAS_DETAIL_ENDPOINT: bool = false;

  fn from_raw(raw: ApiNotulen) -> Self {
    Self {
      id: raw.id,
      tanggal: format_id_date(&raw.tanggal_rapat),
      tempat: raw.lokasi,
      agenda: raw.agenda,
      hasil: raw.dokumen_lampiran.filter(|s| !s.is_empty()),
    }
  }

  fn id(&self) -> &str {
    &self.id
  }

  fn columns() -> &'static [Column] {
    COLUMNS
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.tanggal.clone(),
      self.tempat.clone(),
      self.agenda.clone(),
      self.hasil.clone().unwrap_or_default(),
    ]
  }

  fn fields(&self) -> Vec<(&'static str, &str)> {
    vec![
      ("Tanggal", self.tanggal.as_str()),
      ("Tempat", self.tempat.as_str()),
      ("Agenda", self.agenda.as_str()),
      ("Hasil", self.hasil.as_deref().unwrap_or_default()),
    ]
  }

  fn document(&self) -> Option<&str> {
    self.hasil.as_deref()
  }
}
