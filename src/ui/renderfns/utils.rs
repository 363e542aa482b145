use crate::list_query::FetchStatus;
use ratatui::prelude::{Color, Rect};

/// Truncate a string to `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Border color for a list's fetch status
pub fn status_color(status: FetchStatus) -> Color {
  match status {
    FetchStatus::Ready => Color::Blue,
    FetchStatus::Loading => Color::Yellow,
    FetchStatus::Failed => Color::Red,
    FetchStatus::Idle => Color::DarkGray,
  }
}

/// A `percent_x`% wide, `height` tall rect centered in `area`
pub fn centered_rect(area: Rect, percent_x: u16, height: u16) -> Rect {
  let width = (area.width * percent_x / 100).max(20).min(area.width);
  let height = height.min(area.height);
  let x = area.x + (area.width - width) / 2;
  let y = area.y + (area.height - height) / 2;
  Rect::new(x, y, width, height)
}
