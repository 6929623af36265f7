//! Command handlers for the equipos-billing CLI

pub mod config;
pub mod payments;
pub mod reports;
pub mod rentals;

use crate::cli::commands::OptionalRange;
use crate::config::EquiposConfig;
use crate::domain::types::DateRange;
use crate::error::Result;
use std::io::Read;
use std::path::Path;

pub struct Context {
    pub config: EquiposConfig,
    pub json: bool,
}

/// Read a JSON argument given inline, as `@path` or as `-` for stdin.
pub(crate) fn read_payload(raw: &str) -> Result<serde_json::Value> {
    let text = if raw == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else if let Some(path) = raw.strip_prefix('@') {
        std::fs::read_to_string(Path::new(path))?
    } else {
        raw.to_string()
    };
    Ok(serde_json::from_str(&text)?)
}

/// Open-ended ranges are closed with bounds that every `YYYY-MM-DD` sorts inside.
pub(crate) fn optional_range(range: OptionalRange) -> Option<DateRange> {
    match (range.from, range.to) {
        (None, None) => None,
        (from, to) => Some(DateRange::new(
            from.unwrap_or_else(|| "0000-01-01".to_string()),
            to.unwrap_or_else(|| "9999-12-31".to_string()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_ended_ranges() {
        assert_eq!(optional_range(OptionalRange::default()), None);

        let range = optional_range(OptionalRange {
            from: Some("2025-01-01".to_string()),
            to: None,
        })
        .unwrap();
        assert!(range.contains("2031-06-30"));
        assert!(!range.contains("2024-12-31"));
    }

    #[test]
    fn test_inline_payload() {
        let value = read_payload(r#"{"horas": 2}"#).unwrap();
        assert_eq!(value["horas"], 2);
    }
}
