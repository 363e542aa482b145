use crate::list_query::{DataSource, FetchStatus, ListQuery, MutationKind, MutationStatus};
use crate::records::Resource;
use crate::services::Services;
use crate::ui::components::{
  ConfirmEvent, ConfirmPrompt, EntryForm, FormEvent, KeyResult, SearchEvent, SearchInput,
};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::RecordDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use tracing::info;

/// Table of one resource's records
pub struct RecordListView<R: Resource> {
  services: Services,
  query: ListQuery<R>,
  table_state: TableState,
  search: SearchInput,
  filter: String,
  form: EntryForm,
  confirm: ConfirmPrompt,
  notice: Option<String>,
}

impl<R: Resource> RecordListView<R> {
  pub fn new(services: Services) -> Self {
    let mut query = services.list_query::<R>();
    query.start();

    Self {
      services,
      query,
      table_state: TableState::default(),
      search: SearchInput::new(),
      filter: String::new(),
      form: EntryForm::new(),
      confirm: ConfirmPrompt::new(),
      notice: None,
    }
  }

  fn visible(&self) -> Vec<&R> {
    self
      .query
      .data()
      .iter()
      .filter(|record| record.matches(&self.filter))
      .collect()
  }

  fn selected(&self) -> Option<&R> {
    let idx = self.table_state.selected()?;
    self.visible().get(idx).copied()
  }

  fn title(&self) -> String {
    let state = self.query.state();
    let count = self.visible().len();

    let mut title = format!(" {} ({}) ", R::TITLE, count);
    if !self.filter.is_empty() {
      title.push_str(&format!("[/{}] ", self.filter));
    }

    match state.status() {
      FetchStatus::Loading => title.push_str("(loading...) "),
      FetchStatus::Failed => {
        let error = state.error.as_deref().unwrap_or_default();
        if state.source == Some(DataSource::StaleCache) {
          title.push_str(&format!("(offline copy, {}) ", error));
        } else {
          title.push_str(&format!("(error: {}) ", error));
        }
      }
      FetchStatus::Ready | FetchStatus::Idle => {
        if let Some(meta) = &state.pagination {
          title.push_str(&format!(
            "(page {}/{}, total {}) ",
            meta.current_page, meta.total_pages, meta.total_items
          ));
        }
      }
    }
    title
  }

  fn handle_form_event(&mut self, event: FormEvent) {
    match event {
      FormEvent::Submitted(entry) => match entry.validate::<R>() {
        Ok(()) => match self.query.add(entry) {
          Ok(()) => self.form.set_submitting(),
          Err(e) => self.form.fail(e.to_string()),
        },
        Err(e) => self.form.fail(e.to_string()),
      },
      FormEvent::Cancelled => {}
    }
  }

  fn handle_mutation(&mut self, status: MutationStatus) {
    match status {
      MutationStatus::Succeeded(MutationKind::Add) => {
        self.form.close();
        self.notice = Some("Entry added".to_string());
      }
      MutationStatus::Succeeded(MutationKind::Delete) => {
        self.notice = Some("Entry deleted".to_string());
      }
      MutationStatus::Failed(MutationKind::Add, error) => {
        if self.form.is_active() {
          self.form.fail(error.to_string());
        } else {
          self.notice = Some(error.to_string());
        }
      }
      MutationStatus::Failed(MutationKind::Delete, error) => {
        self.notice = Some(error.to_string());
      }
      MutationStatus::Idle | MutationStatus::Submitting(_) => {}
    }
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.visible().len();
    ensure_valid_selection(&mut self.table_state, len);

    let status = self.query.state().status();
    let mut block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(status_color(status)));

    if let Some(notice) = &self.notice {
      block = block.title_bottom(Line::from(format!(" {} ", notice)).right_aligned());
    }

    if len == 0 {
      let content = if self.query.is_loading() {
        "Loading..."
      } else if status == FetchStatus::Failed {
        "Failed to load records. Press 'r' to retry."
      } else if !self.filter.is_empty() {
        "No records match the search."
      } else {
        "No records."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let columns = R::columns();
    let header = Row::new(
      columns
        .iter()
        .map(|c| Cell::from(c.title).style(Style::default().fg(Color::Yellow).bold())),
    );

    let rows: Vec<Row> = self
      .visible()
      .iter()
      .map(|record| {
        let cells = record
          .cells()
          .into_iter()
          .zip(columns)
          .enumerate()
          .map(|(i, (value, column))| {
            let style = if i == 0 {
              Style::default().fg(Color::Cyan)
            } else {
              Style::default()
            };
            Cell::from(truncate(&value, column.width as usize)).style(style)
          });
        Row::new(cells)
      })
      .collect();

    let widths: Vec<Constraint> = columns.iter().map(|c| Constraint::Length(c.width)).collect();

    let table = Table::new(rows, widths)
      .header(header)
      .block(block)
      .column_spacing(1)
      .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
      .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }
}

impl<R: Resource> View for RecordListView<R> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.form.handle_key(key) {
      KeyResult::Event(event) => {
        self.handle_form_event(event);
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match self.confirm.handle_key(key) {
      KeyResult::Event(ConfirmEvent::Confirmed(id)) => {
        info!(resource = R::PATH, id = %id, "deleting entry");
        self.notice = Some(match self.query.delete(id.clone()) {
          Ok(()) => format!("Deleting {}...", id),
          Err(e) => format!("Cannot delete {}: {}", id, e),
        });
        return ViewAction::None;
      }
      KeyResult::Event(ConfirmEvent::Cancelled) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(query)) => {
        self.filter = query;
        self.table_state.select(Some(0));
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),
      KeyCode::Char('g') | KeyCode::Home => self.table_state.select_first(),
      KeyCode::Char('G') | KeyCode::End => self.table_state.select_last(),
      KeyCode::Char('r') => {
        self.notice = None;
        self.query.refetch();
      }
      KeyCode::Char('a') => {
        if R::form_fields().is_empty() {
          self.notice = Some(format!("{} cannot be added here", R::TITLE));
        } else {
          self.form.open(format!("New {}", R::TITLE), R::form_fields());
        }
      }
      KeyCode::Char('d') => {
        if let Some(id) = self.selected().map(|r| r.id().to_string()) {
          self
            .confirm
            .show(format!("Delete {} {}?", R::TITLE, id), id);
        }
      }
      KeyCode::Enter => {
        if let Some(record) = self.selected().cloned() {
          return ViewAction::Push(Box::new(RecordDetailView::new(
            self.services.clone(),
            record,
          )));
        }
      }
      KeyCode::Esc if !self.filter.is_empty() => {
        self.search.clear();
        self.filter.clear();
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_table(frame, area);
    self.search.render_overlay(frame, area, self.visible().len());
    self.confirm.render_overlay(frame, area);
    self.form.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    R::TITLE.to_string()
  }

  fn tick(&mut self) -> ViewAction {
    self.query.poll();

    if let Some(status) = self.query.take_mutation() {
      self.handle_mutation(status);
    }

    if self.query.signed_out() {
      return ViewAction::SignedOut;
    }
    ViewAction::None
  }

  fn captures_input(&self) -> bool {
    self.search.is_active() || self.form.is_active() || self.confirm.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("d", "delete").with_priority(60),
      ShortcutInfo::new("q", "back").with_priority(90),
    ];
    if !R::form_fields().is_empty() {
      shortcuts.push(ShortcutInfo::new("a", "add").with_priority(50));
    }
    shortcuts
  }
}
