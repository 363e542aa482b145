//! Research completion certificate ("surat keterangan selesai penelitian")
//! written as a one-page A4 PDF.

use chrono::NaiveDate;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::config::CertificateConfig;
use crate::records::{format_long_date, EntryError, FormField, NewEntry};

/// A4 in points
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 56.0;
const INDENT: f32 = 28.0;
const LABEL_WIDTH: f32 = 96.0;
const BODY_SIZE: f32 = 12.0;
const TITLE_SIZE: f32 = 14.0;
const LINE_HEIGHT: f32 = 20.0;
/// Characters per body line at `BODY_SIZE` across the text width.
const WRAP_AT: usize = 80;

const DEFAULT_PURPOSE: &str = "Laporan Tugas Akhir (skripsi)";

const STARTED: FormField = FormField::date("mulai", "Mulai");
const FINISHED: FormField = FormField::date("selesai", "Selesai");

pub const FORM: &[FormField] = &[
  FormField::text("nomor", "Nomor Surat"),
  FormField::text("nama", "Nama Mahasiswa"),
  FormField::text("nim", "NIM"),
  FormField::text("program_studi", "Program Studi"),
  FormField::text("fakultas", "Fakultas"),
  FormField::text("penelitian", "Judul Penelitian"),
  STARTED,
  FINISHED,
  FormField::text("keperluan", "Keperluan").optional(),
];

#[derive(Debug, Error)]
pub enum CertificateError {
  #[error(transparent)]
  Invalid(#[from] EntryError),

  #[error("failed to build PDF: {0}")]
  Render(String),

  #[error("cannot write {path}: {source}")]
  Write {
    path: String,
    #[source]
    source: std::io::Error,
  },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
  pub name: String,
  pub nim: String,
  pub program: String,
  pub faculty: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Certificate {
  pub number: String,
  pub student: Student,
  pub topic: String,
  pub started: NaiveDate,
  pub finished: NaiveDate,
  pub purpose: String,
  pub issued: NaiveDate,
  pub laboratory: String,
  pub signer_name: String,
  pub signer_title: String,
  pub city: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
  Regular,
  Bold,
}

impl Font {
  fn resource_name(self) -> &'static str {
    match self {
      Font::Regular => "F1",
      Font::Bold => "F2",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
struct TextLine {
  x: f32,
  y: f32,
  font: Font,
  size: f32,
  text: String,
}

impl Certificate {
  /// Build from the certificate form's values, issued on `issued`.
  pub fn from_entry(entry: &NewEntry, config: &CertificateConfig, issued: NaiveDate) -> Result<Self, EntryError> {
    entry.validate_fields(FORM)?;

    let text = |name: &str| entry.value(name).unwrap_or_default().to_string();
    let date = |field: FormField| {
      entry
        .value(field.name)
        .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
        .ok_or(EntryError::InvalidDate(field.label))
    };

    let started = date(STARTED)?;
    let finished = date(FINISHED)?;
    if finished < started {
      return Err(EntryError::DateOrder {
        start: STARTED.label,
        end: FINISHED.label,
      });
    }

    Ok(Self {
      number: text("nomor"),
      student: Student {
        name: text("nama"),
        nim: text("nim"),
        program: text("program_studi"),
        faculty: text("fakultas"),
      },
      topic: text("penelitian"),
      started,
      finished,
      purpose: entry.value("keperluan").unwrap_or(DEFAULT_PURPOSE).to_string(),
      issued,
      laboratory: config.laboratory.clone(),
      signer_name: config.signer_name.clone(),
      signer_title: config.signer_title.clone(),
      city: config.city.clone(),
    })
  }

  /// File name for this certificate, unique per student.
  pub fn file_name(&self) -> String {
    let nim: String = self
      .student
      .nim
      .chars()
      .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
      .collect();
    format!("surat-keterangan-penelitian-{}.pdf", nim)
  }

  fn statement(&self) -> String {
    format!(
      "Telah selesai melakukan penelitian di {} tentang {}. Penelitian tersebut dilakukan dari tanggal {} sampai dengan {} yang digunakan untuk {}.",
      self.laboratory,
      self.topic,
      format_long_date(self.started),
      format_long_date(self.finished),
      self.purpose
    )
  }

  fn layout(&self) -> Vec<TextLine> {
    let mut lines = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN - TITLE_SIZE;

    let title = "SURAT KETERANGAN SELESAI PENELITIAN";
    lines.push(TextLine {
      x: (PAGE_WIDTH - approx_width(title, TITLE_SIZE)) / 2.0,
      y,
      font: Font::Bold,
      size: TITLE_SIZE,
      text: title.to_string(),
    });
    y -= LINE_HEIGHT * 2.5;

    row(&mut lines, &mut y, MARGIN, "No.", &self.number);
    row(&mut lines, &mut y, MARGIN, "Lampiran", "-");
    y -= LINE_HEIGHT;

    lines.push(body(MARGIN, y, "Yang bertanda tangan di bawah ini:"));
    y -= LINE_HEIGHT * 1.5;
    row(&mut lines, &mut y, MARGIN + INDENT, "Nama", &self.signer_name);
    row(&mut lines, &mut y, MARGIN + INDENT, "Jabatan", &self.signer_title);
    y -= LINE_HEIGHT;

    lines.push(body(MARGIN, y, "Dengan ini menerangkan bahwa mahasiswa berikut ini:"));
    y -= LINE_HEIGHT * 1.5;
    row(&mut lines, &mut y, MARGIN + INDENT, "Nama", &self.student.name);
    row(&mut lines, &mut y, MARGIN + INDENT, "NIM", &self.student.nim);
    row(&mut lines, &mut y, MARGIN + INDENT, "Program Studi", &self.student.program);
    row(&mut lines, &mut y, MARGIN + INDENT, "Fakultas", &self.student.faculty);
    y -= LINE_HEIGHT;

    for text in wrap(&self.statement(), WRAP_AT) {
      lines.push(body(MARGIN, y, &text));
      y -= LINE_HEIGHT;
    }
    y -= LINE_HEIGHT;

    for text in wrap(
      "Demikian surat keterangan ini dibuat dengan sebenar-benarnya dan tanpa ada paksaan dari pihak manapun.",
      WRAP_AT,
    ) {
      lines.push(body(MARGIN, y, &text));
      y -= LINE_HEIGHT;
    }
    y -= LINE_HEIGHT * 2.0;

    // Signature block, right-aligned with room for a stamp
    let place = format!("{}, {}", self.city, format_long_date(self.issued));
    let signer_title = format!("({})", self.signer_title);
    let right = PAGE_WIDTH - MARGIN;
    let x = right - [place.as_str(), self.signer_name.as_str(), signer_title.as_str()]
      .iter()
      .map(|t| approx_width(t, BODY_SIZE))
      .fold(0.0, f32::max);
    lines.push(body(x, y, &place));
    y -= LINE_HEIGHT * 5.0;
    lines.push(body(x, y, &self.signer_name));
    y -= LINE_HEIGHT;
    lines.push(body(x, y, &signer_title));

    lines
  }

  /// Render the certificate as PDF bytes.
  pub fn render(&self) -> Result<Vec<u8>, CertificateError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(type1_font("Helvetica"));
    let bold = doc.add_object(type1_font("Helvetica-Bold"));
    let resources_id = doc.add_object(dictionary! {
      "Font" => dictionary! {
        Font::Regular.resource_name() => regular,
        Font::Bold.resource_name() => bold,
      },
    });

    let operations: Vec<Operation> = self
      .layout()
      .into_iter()
      .flat_map(|line| {
        vec![
          Operation::new("BT", vec![]),
          Operation::new("Tf", vec![line.font.resource_name().into(), line.size.into()]),
          Operation::new("Td", vec![line.x.into(), line.y.into()]),
          Operation::new("Tj", vec![Object::string_literal(win_ansi(&line.text))]),
          Operation::new("ET", vec![]),
        ]
      })
      .collect();
    let content = Content { operations };
    let encoded = content.encode().map_err(|e| CertificateError::Render(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
      "Type" => "Page",
      "Parent" => pages_id,
      "Contents" => content_id,
    });
    insert_pages(&mut doc, pages_id, page_id, resources_id);

    let catalog_id = doc.add_object(dictionary! {
      "Type" => "Catalog",
      "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc
      .save_to(&mut bytes)
      .map_err(|e| CertificateError::Render(e.to_string()))?;
    Ok(bytes)
  }

  /// Write the PDF into `dir`, creating it if needed.
  pub fn save(&self, dir: &Path) -> Result<PathBuf, CertificateError> {
    let bytes = self.render()?;
    let path = dir.join(self.file_name());
    let write_error = |source| CertificateError::Write {
      path: path.display().to_string(),
      source,
    };

    std::fs::create_dir_all(dir).map_err(write_error)?;
    std::fs::write(&path, bytes).map_err(write_error)?;

    info!(path = %path.display(), "certificate written");
    Ok(path)
  }
}

/// A label/value row, advancing `y` by one line.
fn row(lines: &mut Vec<TextLine>, y: &mut f32, x: f32, label: &str, value: &str) {
  lines.push(body(x, *y, label));
  lines.push(body(x + LABEL_WIDTH, *y, &format!(": {}", value)));
  *y -= LINE_HEIGHT;
}

fn body(x: f32, y: f32, text: &str) -> TextLine {
  TextLine {
    x,
    y,
    font: Font::Regular,
    size: BODY_SIZE,
    text: text.to_string(),
  }
}

fn type1_font(base: &str) -> lopdf::Dictionary {
  dictionary! {
    "Type" => "Font",
    "Subtype" => "Type1",
    "BaseFont" => base,
    "Encoding" => "WinAnsiEncoding",
  }
}

fn insert_pages(doc: &mut Document, pages_id: ObjectId, page_id: ObjectId, resources_id: ObjectId) {
  let pages = dictionary! {
    "Type" => "Pages",
    "Kids" => vec![page_id.into()],
    "Count" => 1,
    "Resources" => resources_id,
    "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
  };
  doc.objects.insert(pages_id, Object::Dictionary(pages));
}

/// Helvetica averages about half an em per character.
fn approx_width(text: &str, size: f32) -> f32 {
  text.chars().count() as f32 * size * 0.5
}

/// Latin-1 bytes for the standard fonts; anything outside becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
  text
    .chars()
    .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
    .collect()
}

/// Greedy word wrap at `width` characters.
fn wrap(text: &str, width: usize) -> Vec<String> {
  let mut lines = Vec::new();
  let mut current = String::new();
  for word in text.split_whitespace() {
    if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
      lines.push(std::mem::take(&mut current));
    }
    if !current.is_empty() {
      current.push(' ');
    }
    current.push_str(word);
  }
  if !current.is_empty() {
    lines.push(current);
  }
  lines
}

#[cfg(test)]
mod tests {
  use super::*;

  fn form_entry() -> NewEntry {
    NewEntry::new()
      .with("nomor", "H/UBL/LAB/010/65/07/24")
      .with("nama", "Rina Lestari")
      .with("nim", "2011/00301")
      .with("program_studi", "Teknik Informatika")
      .with("fakultas", "Teknologi Informasi")
      .with("penelitian", "aplikasi presensi berbasis Android")
      .with("mulai", "2024-05-22")
      .with("selesai", "2024-07-15")
  }

  fn issued() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 16).unwrap()
  }

  fn certificate() -> Certificate {
    Certificate::from_entry(&form_entry(), &CertificateConfig::default(), issued()).unwrap()
  }

  fn page_text(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 1);
    let page_id = *pages.values().next().unwrap();
    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
    content
      .operations
      .iter()
      .filter(|op| op.operator == "Tj")
      .filter_map(|op| match op.operands.first() {
        Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
      })
      .collect()
  }

  #[test]
  fn test_from_entry_fills_defaults() {
    let cert = certificate();
    assert_eq!(cert.student.nim, "2011/00301");
    assert_eq!(cert.purpose, DEFAULT_PURPOSE);
    assert_eq!(cert.laboratory, "Lab ICT");
    assert_eq!(cert.file_name(), "surat-keterangan-penelitian-2011-00301.pdf");
  }

  #[test]
  fn test_missing_field_is_rejected() {
    let entry = form_entry().with("nim", " ");
    assert_eq!(
      Certificate::from_entry(&entry, &CertificateConfig::default(), issued()),
      Err(EntryError::Missing("NIM"))
    );
  }

  #[test]
  fn test_finish_before_start_is_rejected() {
    let entry = form_entry().with("selesai", "2024-05-01");
    assert_eq!(
      Certificate::from_entry(&entry, &CertificateConfig::default(), issued()),
      Err(EntryError::DateOrder {
        start: "Mulai",
        end: "Selesai"
      })
    );
  }

  #[test]
  fn test_render_is_one_a4_page_with_the_text() {
    let bytes = certificate().render().unwrap();
    assert!(bytes.starts_with(b"%PDF-1.5"));

    let text = page_text(&bytes);
    assert_eq!(text[0], "SURAT KETERANGAN SELESAI PENELITIAN");
    assert!(text.contains(&": Rina Lestari".to_string()));
    assert!(text.contains(&"Jakarta, 16 Juli 2024".to_string()));
    assert!(text.join(" ").contains("dari tanggal 22 Mei 2024 sampai dengan 15 Juli 2024"));
  }

  #[test]
  fn test_layout_stays_on_the_page() {
    let cert = Certificate {
      topic: "kata ".repeat(120),
      ..certificate()
    };
    for line in cert.layout() {
      assert!(line.y > 0.0, "line below the page: {:?}", line);
      assert!(line.x >= MARGIN - 1.0);
    }
  }

  #[test]
  fn test_save_writes_into_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("sk");

    let path = certificate().save(&out).unwrap();

    assert_eq!(path, out.join("surat-keterangan-penelitian-2011-00301.pdf"));
    assert!(Document::load(&path).is_ok());
  }

  #[test]
  fn test_wrap() {
    assert_eq!(wrap("satu dua tiga", 8), vec!["satu dua", "tiga"]);
    assert_eq!(wrap("", 8), Vec::<String>::new());
  }

  #[test]
  fn test_win_ansi_replaces_wide_chars() {
    assert_eq!(win_ansi("Café ✓"), vec![b'C', b'a', b'f', 0xE9, b' ', b'?']);
  }
}
