use crate::commands;
use crate::config::{CertificateConfig, Config};
use crate::event::{Event, EventHandler};
use crate::services::Services;
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{self, CertificateView, LoginView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);

/// Main application state
pub struct App {
  /// Navigation stack, root at index 0
  views: Vec<Box<dyn View>>,

  /// `:` command palette
  command: CommandInput,

  services: Services,

  /// Header title (config title or API host)
  title: String,

  /// Last status message shown in the footer
  notice: Option<String>,

  certificate: CertificateConfig,

  should_quit: bool,
}

impl App {
  pub fn new(config: &Config, services: Services) -> Self {
    let title = config
      .title
      .clone()
      .unwrap_or_else(|| services.client.host().to_string());

    let mut app = Self {
      views: Vec::new(),
      command: CommandInput::new(),
      services,
      title,
      notice: None,
      certificate: config.certificate.clone(),
      should_quit: false,
    };
    app.reset_root();
    app
  }

  /// Incoming list when signed in, login otherwise.
  fn reset_root(&mut self) {
    let root: Box<dyn View> = if self.services.session.is_authenticated() {
      views::list_view("masuk", &self.services).unwrap_or_else(|| Box::new(LoginView::new(self.services.clone())))
    } else {
      Box::new(LoginView::new(self.services.clone()))
    };
    self.views = vec![root];
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(TICK_RATE);

    let result = self.event_loop(&mut terminal, &mut events).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.tick(),
        None => break,
      }
    }
    Ok(())
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let view_capturing = self.views.last().map(|v| v.captures_input()).unwrap_or(false);
    if !view_capturing || self.command.is_active() {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    if let Some(view) = self.views.last_mut() {
      let action = view.handle_key(key);
      self.apply(action);
    }
  }

  /// Poll every view on the stack, so lists below a detail view keep
  /// refreshing.
  fn tick(&mut self) {
    let mut actions = Vec::new();
    for view in self.views.iter_mut() {
      actions.push(view.tick());
    }
    for action in actions {
      self.apply(action);
    }
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.views.push(view),
      ViewAction::Pop => {
        if self.views.len() > 1 {
          self.views.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::Replace(view) => {
        self.notice = None;
        self.views = vec![view];
      }
      ViewAction::SignedOut => {
        warn!("session rejected, returning to login");
        self.views = vec![Box::new(
          LoginView::new(self.services.clone()).with_error("Session expired, sign in again"),
        )];
      }
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    let cmd = commands::resolve(cmd).unwrap_or(cmd);
    match cmd {
      "quit" => self.should_quit = true,
      "logout" => {
        info!("signing out");
        let _ = self.services.logout();
        self.notice = Some("Signed out".to_string());
        self.views = vec![Box::new(LoginView::new(self.services.clone()))];
      }
      _ if !self.services.session.is_authenticated() => {
        self.notice = Some("Sign in first".to_string());
      }
      "sertifikat" => {
        self.notice = None;
        self.views.push(Box::new(CertificateView::new(self.certificate.clone())));
      }
      _ => match views::list_view(cmd, &self.services) {
        Some(view) => {
          self.notice = None;
          self.views = vec![view];
        }
        None => self.notice = Some(format!("Unknown command: {}", cmd)),
      },
    }
  }

  // Accessors for rendering

  pub fn render_current(&mut self, frame: &mut Frame, area: Rect) {
    if let Some(view) = self.views.last_mut() {
      view.render(frame, area);
    }
  }

  pub fn command(&self) -> &CommandInput {
    &self.command
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn host(&self) -> &str {
    self.services.client.host()
  }

  pub fn notice(&self) -> Option<&str> {
    self.notice.as_deref()
  }

  pub fn current_shortcuts(&self) -> Vec<ShortcutInfo> {
    self.views.last().map(|v| v.shortcuts()).unwrap_or_default()
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self.views.iter().map(|v| v.breadcrumb_label()).collect()
  }
}
