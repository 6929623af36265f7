//! Calendar helpers for `fecha` strings.
//!
//! Records carry their business date as `YYYY-MM-DD` text, which sorts the
//! same way lexicographically and chronologically; range checks rely on it.

use chrono::{Datelike, NaiveDate};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(fecha: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(fecha.trim(), DATE_FORMAT).ok()
}

/// `(ano, mes)` derived from a valid fecha.
pub fn year_month(fecha: &str) -> Option<(i32, u32)> {
    parse_date(fecha).map(|d| (d.year(), d.month()))
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

/// Inclusive on both ends.
pub fn in_range(fecha: &str, start: &str, end: &str) -> bool {
    !fecha.is_empty() && start <= fecha && fecha <= end
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn today() -> String {
    format_date(chrono::Local::now().date_naive())
}
