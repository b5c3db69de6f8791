use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};

/// Uppercase and trim a free-text key. Every string comparison in the
/// reconciliation layer goes through this; skipping it produces false
/// pending matches from case and padding differences in the sources.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Parse a date from the formats the trip-log and consignment feeds have
/// shipped over time. Returns `None` rather than failing the row.
pub fn parse_date_flexible(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%d-%b-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }

    // API exports sometimes carry a time component.
    const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }

    None
}

/// Coerce a freight/quantity field to a non-negative number.
/// Invalid and negative values become zero.
pub fn parse_amount_lossy(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<f64>().unwrap_or(0.0).max(0.0)
}

/// Coerce a count field to a non-negative integer, truncating decimals.
pub fn parse_count_lossy(raw: &str) -> u32 {
    parse_amount_lossy(raw) as u32
}

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or(NaiveDate::MAX)
        .checked_sub_days(Days::new(1))
        .unwrap_or(NaiveDate::MAX)
}

/// Calendar month containing `date`, as an inclusive (start, end) pair.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date);
    (start, last_day_of_month(date.year(), date.month()))
}
