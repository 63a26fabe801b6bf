//! Lenient date parsing for the Date Format operation

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::model::CellValue;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// Month-first before day-first for ambiguous slashed dates
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%Y%m%d",
];

/// Coerce a cell to a date or date-time; `None` when it cannot be parsed
pub fn parse_date_cell(cell: &CellValue) -> Option<CellValue> {
    match cell {
        CellValue::Date(_) | CellValue::DateTime(_) => Some(cell.clone()),
        CellValue::String(s) => parse_date_str(s),
        CellValue::Int(i) if (10_000_101..=99_991_231).contains(i) => {
            NaiveDate::parse_from_str(&i.to_string(), "%Y%m%d").ok().map(CellValue::Date)
        }
        _ => None,
    }
}

/// Parse text as a date-time first, then as a plain date
pub fn parse_date_str(s: &str) -> Option<CellValue> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(CellValue::DateTime(dt.naive_utc()));
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(CellValue::DateTime(dt));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(CellValue::Date(d));
        }
    }

    None
}
