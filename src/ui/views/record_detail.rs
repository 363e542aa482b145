use crate::query::{Query, QueryState};
use crate::records::Resource;
use crate::services::Services;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Labelled fields of one record
pub struct RecordDetailView<R: Resource> {
  services: Services,
  id: String,
  /// The list row, shown until the detail arrives
  summary: R,
  query: Query<R>,
  scroll: u16,
}

impl<R: Resource> RecordDetailView<R> {
  pub fn new(services: Services, summary: R) -> Self {
    let id = summary.id().to_string();

    let query = if R::HAS_DETAIL_ENDPOINT {
      let fetcher = services.fetcher::<R>();
      let record_id = id.clone();
      let mut query = Query::new(move || {
        let fetcher = fetcher.clone();
        let id = record_id.clone();
        async move { fetcher.fetch_one(&id).await }
      });
      query.fetch();
      query
    } else {
      Query::ready(summary.clone())
    };

    Self {
      services,
      id,
      summary,
      query,
      scroll: 0,
    }
  }

  fn record(&self) -> &R {
    self.query.data().unwrap_or(&self.summary)
  }

  fn lines(&self) -> Vec<Line<'_>> {
    let record = self.record();
    let label_width = record.fields().iter().map(|(l, _)| l.len()).max().unwrap_or(0) + 2;

    let mut lines: Vec<Line> = record
      .fields()
      .into_iter()
      .map(|(label, value)| {
        let value = if value.is_empty() { "-" } else { value };
        Line::from(vec![
          Span::styled(
            format!("{:<width$}", label, width = label_width),
            Style::default().fg(Color::DarkGray),
          ),
          Span::raw(value.to_string()),
        ])
      })
      .collect();

    if let Some(document) = record.document() {
      let link = self
        .services
        .client
        .file_view_url(document)
        .unwrap_or_else(|| document.to_string());
      lines.push(Line::from(""));
      lines.push(Line::from(vec![
        Span::styled(
          format!("{:<width$}", "Dokumen", width = label_width),
          Style::default().fg(Color::DarkGray),
        ),
        Span::styled(link, Style::default().fg(Color::Cyan).underlined()),
      ]));
    }

    lines
  }
}

impl<R: Resource> View for RecordDetailView<R> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = match self.query.state() {
      QueryState::Loading => format!(" {} (loading...) ", self.id),
      QueryState::Error(e) => format!(" {} (error: {}) ", self.id, e),
      _ => format!(" {} ", self.id),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let paragraph = Paragraph::new(self.lines())
      .block(block)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0));
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    self.id.clone()
  }

  fn tick(&mut self) -> ViewAction {
    self.query.poll();
    if self.query.is_unauthorized() {
      return ViewAction::SignedOut;
    }
    ViewAction::None
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("r", "refresh").with_priority(10),
      ShortcutInfo::new("j/k", "scroll").with_priority(20),
      ShortcutInfo::new("q", "back").with_priority(30),
    ]
  }
}
