use super::input::TextInput;
use super::KeyResult;
use crate::records::{FieldKind, FormField, NewEntry};
use crate::ui::renderfns::centered_rect;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum FormEvent {
  Submitted(NewEntry),
  Cancelled,
}

/// Add-entry form overlay
#[derive(Debug, Clone, Default)]
pub struct EntryForm {
  active: bool,
  title: String,
  fields: &'static [FormField],
  inputs: Vec<TextInput>,
  focused: usize,
  error: Option<String>,
  submitting: bool,
}

impl EntryForm {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn open(&mut self, title: String, fields: &'static [FormField]) {
    self.active = true;
    self.title = title;
    self.fields = fields;
    self.inputs = fields.iter().map(|_| TextInput::new()).collect();
    self.focused = 0;
    self.error = None;
    self.submitting = false;
  }

  pub fn close(&mut self) {
    self.active = false;
    self.inputs.clear();
    self.error = None;
    self.submitting = false;
  }

  /// Show a rejection and allow editing again.
  pub fn fail(&mut self, message: String) {
    self.error = Some(message);
    self.submitting = false;
  }

  pub fn set_submitting(&mut self) {
    self.error = None;
    self.submitting = true;
  }

  #[cfg(test)]
  pub fn is_submitting(&self) -> bool {
    self.submitting
  }

  #[cfg(test)]
  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  /// The form's values as an entry. Attachment fields hold a local path.
  pub fn entry(&self) -> NewEntry {
    let mut entry = NewEntry::new();
    for (field, input) in self.fields.iter().zip(&self.inputs) {
      match field.kind {
        FieldKind::Attachment => {
          let path = input.value().trim();
          if !path.is_empty() {
            entry.set_attachment(Some(expand_home(path)));
          }
        }
        FieldKind::Text | FieldKind::Date => entry.set(field.name, input.value()),
      }
    }
    entry
  }

  fn focus_next(&mut self) {
    if !self.inputs.is_empty() {
      self.focused = (self.focused + 1) % self.inputs.len();
    }
  }

  fn focus_prev(&mut self) {
    if !self.inputs.is_empty() {
      self.focused = (self.focused + self.inputs.len() - 1) % self.inputs.len();
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    if key.code == KeyCode::Esc {
      self.close();
      return KeyResult::Event(FormEvent::Cancelled);
    }

    if self.submitting {
      return KeyResult::Handled;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
      KeyCode::Char('s') if ctrl => return KeyResult::Event(FormEvent::Submitted(self.entry())),
      KeyCode::Tab | KeyCode::Down => self.focus_next(),
      KeyCode::BackTab | KeyCode::Up => self.focus_prev(),
      KeyCode::Enter => {
        if self.focused + 1 == self.inputs.len() {
          return KeyResult::Event(FormEvent::Submitted(self.entry()));
        }
        self.focus_next();
      }
      _ => {
        if let Some(input) = self.inputs.get_mut(self.focused) {
          input.handle_key(key);
        }
      }
    }
    KeyResult::Handled
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let height = (self.fields.len() as u16 + 4).min(area.height);
    let overlay_area = centered_rect(area, 80, height);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title))
      .title_bottom(Line::from(" Tab next  Enter/Ctrl-S save  Esc cancel ").right_aligned());

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(1), Constraint::Length(1)])
      .split(inner);

    let label_width = self.fields.iter().map(|f| f.label.len()).max().unwrap_or(0) + 2;

    let items: Vec<ListItem> = self
      .fields
      .iter()
      .zip(&self.inputs)
      .enumerate()
      .map(|(i, (field, input))| {
        let marker = if field.required { "*" } else { " " };
        let label = format!("{}{:<width$}", marker, field.label, width = label_width);

        let value = if input.is_empty() && i != self.focused {
          Span::styled(placeholder(field.kind), Style::default().fg(Color::DarkGray))
        } else {
          Span::raw(input.value().to_string())
        };

        let mut spans = vec![Span::styled(label, Style::default().fg(Color::Cyan)), value];
        if i == self.focused {
          spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        }
        ListItem::new(Line::from(spans))
      })
      .collect();

    let list = List::new(items).highlight_style(Style::default().bg(Color::DarkGray));
    let mut state = ListState::default();
    state.select(Some(self.focused));
    frame.render_stateful_widget(list, chunks[0], &mut state);

    let status = if self.submitting {
      Span::styled("Saving...", Style::default().fg(Color::Yellow))
    } else if let Some(error) = &self.error {
      Span::styled(error.as_str(), Style::default().fg(Color::Red))
    } else {
      Span::raw("")
    };
    frame.render_widget(Paragraph::new(Line::from(status)), chunks[1]);
  }
}

fn placeholder(kind: FieldKind) -> &'static str {
  match kind {
    FieldKind::Text => "",
    FieldKind::Date => "YYYY-MM-DD",
    FieldKind::Attachment => "path to PDF or image",
  }
}

fn expand_home(path: &str) -> PathBuf {
  match path.strip_prefix("~/") {
    Some(rest) => dirs::home_dir()
      .map(|home| home.join(rest))
      .unwrap_or_else(|| PathBuf::from(path)),
    None => PathBuf::from(path),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const FIELDS: &[FormField] = &[
    FormField::text("perihal", "Perihal"),
    FormField::date("tanggal", "Tanggal"),
    FormField::attachment("scan_surat", "Scan"),
  ];

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(form: &mut EntryForm, s: &str) {
    for c in s.chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[test]
  fn test_collects_values_and_attachment() {
    let mut form = EntryForm::new();
    form.open("Tambah".to_string(), FIELDS);

    type_str(&mut form, "Undangan");
    form.handle_key(key(KeyCode::Enter));
    type_str(&mut form, "2024-05-01");
    form.handle_key(key(KeyCode::Tab));
    type_str(&mut form, "/tmp/scan.pdf");

    let KeyResult::Event(FormEvent::Submitted(entry)) = form.handle_key(key(KeyCode::Enter)) else {
      panic!("expected submission");
    };
    assert_eq!(entry.value("perihal"), Some("Undangan"));
    assert_eq!(entry.value("tanggal"), Some("2024-05-01"));
    assert_eq!(entry.attachment(), Some(std::path::Path::new("/tmp/scan.pdf")));
  }

  #[test]
  fn test_keys_ignored_while_submitting() {
    let mut form = EntryForm::new();
    form.open("Tambah".to_string(), FIELDS);
    form.set_submitting();
    type_str(&mut form, "abc");
    assert_eq!(form.entry().value("perihal"), None);

    form.fail("Nomor surat sudah ada".to_string());
    type_str(&mut form, "abc");
    assert_eq!(form.entry().value("perihal"), Some("abc"));
  }

  #[test]
  fn test_escape_cancels() {
    let mut form = EntryForm::new();
    form.open("Tambah".to_string(), FIELDS);
    assert!(matches!(
      form.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(FormEvent::Cancelled)
    ));
    assert!(!form.is_active());
  }
}
