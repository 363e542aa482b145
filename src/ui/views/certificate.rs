use crate::certificate::{Certificate, CertificateError, FORM};
use crate::config::CertificateConfig;
use crate::ui::components::{EntryForm, FormEvent, KeyResult};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use std::path::PathBuf;
use tracing::warn;

const FORM_TITLE: &str = "Surat Keterangan Penelitian";

/// Certificate form; each submission writes one PDF.
pub struct CertificateView {
  config: CertificateConfig,
  form: EntryForm,
  saved: Vec<PathBuf>,
}

impl CertificateView {
  pub fn new(config: CertificateConfig) -> Self {
    let mut form = EntryForm::new();
    form.open(FORM_TITLE.to_string(), FORM);
    Self {
      config,
      form,
      saved: Vec::new(),
    }
  }

  fn submit(&mut self, event: FormEvent) -> ViewAction {
    let FormEvent::Submitted(entry) = event else {
      return ViewAction::Pop;
    };

    let issued = Local::now().date_naive();
    let result = Certificate::from_entry(&entry, &self.config, issued)
      .map_err(CertificateError::from)
      .and_then(|cert| cert.save(&self.config.output_directory()));

    match result {
      Ok(path) => {
        self.form.close();
        self.saved.push(path);
      }
      Err(e) => {
        warn!(error = %e, "certificate not written");
        self.form.fail(e.to_string());
      }
    }
    ViewAction::None
  }
}

impl View for CertificateView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.form.handle_key(key) {
      KeyResult::Event(event) => return self.submit(event),
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('n') => {
        self.form.open(FORM_TITLE.to_string(), FORM);
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = self
      .saved
      .iter()
      .map(|path| Line::from(format!("Saved {}", path.display())))
      .collect();
    if lines.is_empty() {
      lines.push(Line::from(Span::styled(
        format!("PDFs are written to {}", self.config.output_directory().display()),
        Style::default().fg(Color::DarkGray),
      )));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
      Block::default()
        .title(format!(" {} ", FORM_TITLE))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue)),
    );
    frame.render_widget(paragraph, area);
    self.form.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Sertifikat".to_string()
  }

  fn captures_input(&self) -> bool {
    self.form.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("n", "new").with_priority(20),
      ShortcutInfo::new("q", "back").with_priority(30),
    ]
  }
}
