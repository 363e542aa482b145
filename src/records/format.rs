use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Render a server date in Indonesian short form (`d/m/yyyy`).
///
/// Timestamps are reduced to their UTC calendar date. Values that do not
/// parse are returned unchanged.
pub fn format_id_date(raw: &str) -> String {
  let raw = raw.trim();
  match parse_date(raw) {
    Some(date) => format!("{}/{}/{}", date.day(), date.month(), date.year()),
    None => raw.to_string(),
  }
}

const MONTHS: [&str; 12] = [
  "Januari",
  "Februari",
  "Maret",
  "April",
  "Mei",
  "Juni",
  "Juli",
  "Agustus",
  "September",
  "Oktober",
  "November",
  "Desember",
];

/// Indonesian long form, e.g. `22 Mei 2024`.
pub fn format_long_date(date: NaiveDate) -> String {
  format!("{} {} {}", date.day(), MONTHS[date.month0() as usize], date.year())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.naive_utc().date());
  }
  if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
    return Some(dt.date());
  }
  NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
