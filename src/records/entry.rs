//! Add-entry payloads.

use chrono::NaiveDate;
use mime_guess::mime;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{FieldKind, FormField, Resource};
use crate::api::types::{Attachment, EntryBody};

/// Uploads must be smaller than this.
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
  #[error("{0} is required")]
  Missing(&'static str),

  #[error("{0} must be a date (YYYY-MM-DD)")]
  InvalidDate(&'static str),

  #[error("{end} must not be before {start}")]
  DateOrder { start: &'static str, end: &'static str },

  #[error("only PDF and image files are supported")]
  UnsupportedAttachment,

  #[error("attachment must be smaller than 5MB")]
  AttachmentTooLarge,

  #[error("cannot read attachment {path}: {reason}")]
  UnreadableAttachment { path: String, reason: String },
}

/// Values collected from an add-entry form, keyed by field name.
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
  values: Vec<(String, String)>,
  attachment: Option<PathBuf>,
}

impl NewEntry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Set a text or date value. Blank values are dropped.
  pub fn with(mut self, name: &str, value: &str) -> Self {
    self.set(name, value);
    self
  }

  pub fn set(&mut self, name: &str, value: &str) {
    self.values.retain(|(n, _)| n != name);
    let value = value.trim();
    if !value.is_empty() {
      self.values.push((name.to_string(), value.to_string()));
    }
  }

  #[cfg(test)]
  pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
    self.attachment = Some(path.into());
    self
  }

  pub fn set_attachment(&mut self, path: Option<PathBuf>) {
    self.attachment = path;
  }

  pub fn value(&self, name: &str) -> Option<&str> {
    self
      .values
      .iter()
      .find(|(n, _)| n == name)
      .map(|(_, v)| v.as_str())
  }

  pub fn attachment(&self) -> Option<&Path> {
    self.attachment.as_deref()
  }

  /// Check required fields and date formats against `R`'s form.
  pub fn validate<R: Resource>(&self) -> Result<(), EntryError> {
    self.validate_fields(R::form_fields())
  }

  /// Check required values, dates and the attachment against `fields`.
  pub fn validate_fields(&self, fields: &[FormField]) -> Result<(), EntryError> {
    for field in fields {
      match field.kind {
        FieldKind::Attachment => {
          if field.required && self.attachment.is_none() {
            return Err(EntryError::Missing(field.label));
          }
        }
        FieldKind::Text | FieldKind::Date => match self.value(field.name) {
          None if field.required => return Err(EntryError::Missing(field.label)),
          Some(value) if field.kind == FieldKind::Date => {
            if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
              return Err(EntryError::InvalidDate(field.label));
            }
          }
          _ => {}
        },
      }
    }

    if let Some(path) = &self.attachment {
      if !is_supported_attachment(path) {
        return Err(EntryError::UnsupportedAttachment);
      }
    }

    Ok(())
  }

  /// Validate and build the request body, reading the attachment from disk.
  ///
  /// Multipart is used when a file is attached or the resource always
  /// submits multipart; JSON otherwise.
  pub async fn into_body<R: Resource>(self) -> Result<EntryBody, EntryError> {
    self.validate::<R>()?;

    let attachment = match &self.attachment {
      Some(path) => Some(read_attachment::<R>(path).await?),
      None => None,
    };

    if attachment.is_none() && !R::ALWAYS_MULTIPART {
      let map = self
        .values
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect();
      return Ok(EntryBody::Json(map));
    }

    Ok(EntryBody::Multipart {
      fields: self.values,
      attachment,
    })
  }
}

fn attachment_mime(path: &Path) -> mime::Mime {
  mime_guess::from_path(path).first_or_octet_stream()
}

fn is_supported_attachment(path: &Path) -> bool {
  let guessed = attachment_mime(path);
  guessed.type_() == mime::IMAGE || (guessed.type_() == mime::APPLICATION && guessed.subtype() == mime::PDF)
}

async fn read_attachment<R: Resource>(path: &Path) -> Result<Attachment, EntryError> {
  let unreadable = |e: std::io::Error| EntryError::UnreadableAttachment {
    path: path.display().to_string(),
    reason: e.to_string(),
  };

  let metadata = tokio::fs::metadata(path).await.map_err(unreadable)?;
  if metadata.len() >= MAX_ATTACHMENT_BYTES {
    return Err(EntryError::AttachmentTooLarge);
  }

  let bytes = tokio::fs::read(path).await.map_err(unreadable)?;

  let field = R::form_fields()
    .iter()
    .find(|f| f.kind == FieldKind::Attachment)
    .map(|f| f.name)
    .unwrap_or("file");

  let file_name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| "upload".to_string());

  Ok(Attachment {
    field: field.to_string(),
    file_name,
    mime: attachment_mime(path).to_string(),
    bytes,
  })
}
