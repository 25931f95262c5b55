//! Daily queue numbers: `YYYYMMDD-NNN`, restarting at 001 each day.

use chrono::NaiveDate;

/// Date half of a queue number, e.g. "20260823"
pub fn queue_prefix(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Render the nth number of the day. The sequence is zero-padded to three
/// digits but keeps counting past 999 without wrapping.
pub fn format_queue_number(date: NaiveDate, seq: u32) -> String {
    format!("{}-{:03}", queue_prefix(date), seq)
}

/// Pull the sequence out of a queue number carrying the given prefix.
/// Returns `None` for other days or malformed values.
pub fn parse_queue_number(prefix: &str, queue_number: &str) -> Option<u32> {
    let rest = queue_number.strip_prefix(prefix)?;
    let seq = rest.strip_prefix('-')?;
    seq.parse().ok()
}
