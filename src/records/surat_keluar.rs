use serde::{Deserialize, Serialize};

use super::{format_id_date, Column, FormField, Resource};
use crate::api::types::ApiSuratKeluar;

/// Outgoing correspondence (surat keluar).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuratKeluar {
  pub id: String,
  pub surat_nomor: String,
  pub tanggal: String,
  pub tempat_surat: String,
  pub lampiran: String,
  pub isi_surat: String,
  pub penerima: String,
  pub pengirim: String,
  pub jabatan_pengirim: String,
  pub gambar: Option<String>,
  pub keterangan_gambar: String,
  pub sifat_surat: String,
}

const COLUMNS: &[Column] = &[
  Column::new("Nomor Surat", 22),
  Column::new("Tanggal Surat", 13),
  Column::new("Pengirim", 22),
  Column::new("Penerima", 22),
];

const FORM: &[FormField] = &[
  FormField::date("tanggal", "Tanggal Surat"),
  FormField::text("tempat_surat", "Tempat Surat"),
  FormField::text("lampiran", "Lampiran"),
  FormField::text("isi_surat", "Isi Surat"),
  FormField::text("penerima", "Penerima"),
  FormField::text("pengirim", "Pengirim"),
  FormField::text("jabatan_pengirim", "Jabatan Pengirim"),
  FormField::attachment("gambar", "Gambar"),
  FormField::text("keterangan_gambar", "Keterangan Gambar"),
  FormField::text("sifat_surat", "Sifat Surat"),
  FormField::text("keterangan", "Keterangan"),
  FormField::text("deskripsi", "Deskripsi"),
  FormField::text("kategori", "Kategori"),
];

impl Resource for SuratKeluar {
  type Raw = ApiSuratKeluar;

  const PATH: &'static str = "surat-keluar";
  const CACHE_KEY: &'static str = "surat_keluar_cache";
  const TITLE: &'static str = "Surat Keluar";
  const ALWAYS_MULTIPART: bool = true;

  fn from_raw(raw: ApiSuratKeluar) -> Self {
    Self {
      id: raw.id,
      surat_nomor: raw.surat_nomor,
      tanggal: format_id_date(&raw.tanggal),
      tempat_surat: raw.tempat_surat,
      lampiran: raw.lampiran,
      isi_surat: raw.isi_surat,
      penerima: raw.penerima,
      pengirim: raw.pengirim,
      jabatan_pengirim: raw.jabatan_pengirim,
      gambar: raw.gambar.filter(|s| !s.is_empty()),
      keterangan_gambar: raw.keterangan_gambar,
      sifat_surat: raw.sifat_surat,
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
      self.surat_nomor.clone(),
      self.tanggal.clone(),
      self.pengirim.clone(),
      self.penerima.clone(),
    ]
  }

  fn fields(&self) -> Vec<(&'static str, &str)> {
    vec![
      ("Nomor Surat", self.surat_nomor.as_str()),
      ("Tanggal", self.tanggal.as_str()),
      ("Tempat", self.tempat_surat.as_str()),
      ("Lampiran", self.lampiran.as_str()),
      ("Sifat Surat", self.sifat_surat.as_str()),
      ("Pengirim", self.pengirim.as_str()),
      ("Jabatan Pengirim", self.jabatan_pengirim.as_str()),
      ("Penerima", self.penerima.as_str()),
      ("Isi Surat", self.isi_surat.as_str()),
      ("Keterangan Gambar", self.keterangan_gambar.as_str()),
    ]
  }

  fn document(&self) -> Option<&str> {
    self.gambar.as_deref()
  }

  fn form_fields() -> &'static [FormField] {
    FORM
  }
}
