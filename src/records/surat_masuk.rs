use serde::{Deserialize, Serialize};

use super::{format_id_date, Column, FormField, Resource};
use crate::api::types::ApiSuratMasuk;

/// Incoming correspondence (surat masuk).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuratMasuk {
  pub nomor_surat: String,
  pub tanggal_surat: String,
  pub perihal: String,
  pub tujuan_surat: String,
  pub organisasi: String,
  pub pengirim: String,
  pub penerima: String,
  #[serde(default)]
  pub sifat_surat: String,
  #[serde(default)]
  pub kategori: String,
  #[serde(default)]
  pub alamat: String,
  #[serde(default)]
  pub diteruskan_kepada: String,
  #[serde(default)]
  pub isi_disposisi: String,
  #[serde(default)]
  pub scan_surat: Option<String>,
}

const COLUMNS: &[Column] = &[
  Column::new("Nomor Surat", 18),
  Column::new("Tanggal", 11),
  Column::new("Perihal", 28),
  Column::new("Organisasi", 16),
  Column::new("Tujuan", 16),
  Column::new("Pengirim", 14),
  Column::new("Penerima", 14),
];

const FORM: &[FormField] = &[
  FormField::text("no_surat_masuk", "Nomor Surat"),
  FormField::date("tanggal", "Tanggal Surat"),
  FormField::text("alamat", "Alamat").optional(),
  FormField::text("perihal", "Perihal"),
  FormField::text("organisasi", "Organisasi"),
  FormField::text("tujuan", "Tujuan Surat"),
  FormField::text("pengirim", "Pengirim"),
  FormField::text("penerima", "Penerima"),
  FormField::text("sifat_surat", "Sifat Surat").optional(),
  FormField::date("expired_data", "Expired Data").optional(),
  FormField::text("diteruskan_kepada", "Diteruskan Kepada").optional(),
  FormField::text("kategori", "Kategori").optional(),
  FormField::date("tanggal_penyelesaian", "Tanggal Penyelesaian").optional(),
  FormField::text("isi_disposisi", "Disposisi").optional(),
  FormField::attachment("scan_surat", "Scan Surat"),
];

impl Resource for SuratMasuk {
  type Raw = ApiSuratMasuk;

  const PATH: &'static str = "surat-masuk";
  const CACHE_KEY: &'static str = "surat_masuk_cache";
  const TITLE: &'static str = "Surat Masuk";

  fn from_raw(raw: ApiSuratMasuk) -> Self {
    Self {
      nomor_surat: raw.no_surat_masuk,
      tanggal_surat: format_id_date(&raw.tanggal),
      perihal: raw.perihal,
      tujuan_surat: raw.tujuan,
      organisasi: raw.organisasi,
      pengirim: raw.pengirim,
      penerima: raw.penerima,
      sifat_surat: raw.sifat_surat,
      kategori: raw.kategori,
      alamat: raw.alamat,
      diteruskan_kepada: raw.diteruskan_kepada,
      isi_disposisi: raw.isi_disposisi,
      scan_surat: raw.scan_surat.filter(|s| !s.is_empty()),
    }
  }

  fn id(&self) -> &str {
    &self.nomor_surat
  }

  fn columns() -> &'static [Column] {
    COLUMNS
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.nomor_surat.clone(),
      self.tanggal_surat.clone(),
      self.perihal.clone(),
      self.organisasi.clone(),
      self.tujuan_surat.clone(),
      self.pengirim.clone(),
      self.penerima.clone(),
    ]
  }

  fn fields(&self) -> Vec<(&'static str, &str)> {
    vec![
      ("Nomor Surat", self.nomor_surat.as_str()),
      ("Tanggal", self.tanggal_surat.as_str()),
      ("Perihal", self.perihal.as_str()),
      ("Tujuan", self.tujuan_surat.as_str()),
      ("Organisasi", self.organisasi.as_str()),
      ("Pengirim", self.pengirim.as_str()),
      ("Penerima", self.penerima.as_str()),
      ("Sifat Surat", self.sifat_surat.as_str()),
      ("Kategori", self.kategori.as_str()),
      ("Alamat", self.alamat.as_str()),
      ("Diteruskan Kepada", self.diteruskan_kepada.as_str()),
      ("Disposisi", self.isi_disposisi.as_str()),
    ]
  }

  fn document(&self) -> Option<&str> {
    self.scan_surat.as_deref()
  }

  fn form_fields() -> &'static [FormField] {
    FORM
  }
}
