use crate::records::SuratMasuk;
use crate::services::Services;
use crate::ui::components::{InputResult, TextInput};
use crate::ui::renderfns::centered_rect;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::RecordListView;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Token entry. The only view shown while signed out.
pub struct LoginView {
  services: Services,
  input: TextInput,
  error: Option<String>,
}

impl LoginView {
  pub fn new(services: Services) -> Self {
    Self {
      services,
      input: TextInput::new(),
      error: None,
    }
  }

  pub fn with_error(mut self, error: impl Into<String>) -> Self {
    self.error = Some(error.into());
    self
  }
}

impl View for LoginView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.input.handle_key(key) {
      InputResult::Submitted(token) => {
        if self.services.session.login(&token) {
          self.input.clear();
          ViewAction::Replace(Box::new(RecordListView::<SuratMasuk>::new(self.services.clone())))
        } else {
          self.error = Some("Token must not be empty".to_string());
          ViewAction::None
        }
      }
      InputResult::Cancelled => ViewAction::Pop,
      InputResult::Consumed => {
        self.error = None;
        ViewAction::None
      }
      InputResult::NotHandled => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let box_area = centered_rect(area, 60, 7);
    frame.render_widget(Clear, box_area);

    let mut lines = vec![
      Line::from(Span::styled(
        format!("Bearer token for {}", self.services.client.host()),
        Style::default().fg(Color::DarkGray),
      )),
      Line::from(""),
      Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Yellow)),
        Span::raw(self.input.masked()),
        Span::styled("_", Style::default().fg(Color::Yellow)),
      ]),
    ];
    if let Some(error) = &self.error {
      lines.push(Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red))));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
      Block::default()
        .title(" Sign in ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue)),
    );
    frame.render_widget(paragraph, box_area);
  }

  fn breadcrumb_label(&self) -> String {
    "Login".to_string()
  }

  fn captures_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("enter", "sign in").with_priority(10),
      ShortcutInfo::new("esc", "quit").with_priority(20),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::EfilingClient;
  use crate::cache::{ListCache, DEFAULT_TTL};
  use crate::session::Session;
  use crate::store::{PersistedStore, SqliteStore};
  use crossterm::event::{KeyCode, KeyModifiers};

  fn services() -> Services {
    let store = PersistedStore::new(SqliteStore::in_memory().unwrap());
    // Nothing listens here; list fetches just fail
    let client = EfilingClient::new("http://127.0.0.1:9/").unwrap();
    Services::new(client, ListCache::new(store.clone(), DEFAULT_TTL), Session::new(store))
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[tokio::test]
  async fn test_enter_stores_token_and_opens_list() {
    let services = services();
    let mut view = LoginView::new(services.clone());

    for c in "tok".chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
    let action = view.handle_key(key(KeyCode::Enter));

    assert!(matches!(action, ViewAction::Replace(_)));
    assert_eq!(
      services.session.credential().map(|c| c.token().to_string()),
      Some("tok".to_string())
    );
  }

  #[tokio::test]
  async fn test_blank_token_is_rejected() {
    let services = services();
    let mut view = LoginView::new(services.clone());

    view.handle_key(key(KeyCode::Char(' ')));
    let action = view.handle_key(key(KeyCode::Enter));

    assert!(matches!(action, ViewAction::None));
    assert!(view.error.is_some());
    assert!(!services.session.is_authenticated());
  }
}
