// Timestamp formatting for tables and summaries

use chrono::{Local, TimeZone};

/// Out-of-range timestamps print as the raw number
fn format_local(ts: i64, fmt: &str) -> String {
    match Local.timestamp_opt(ts, 0).earliest() {
        Some(dt) => dt.format(fmt).to_string(),
        None => ts.to_string(),
    }
}

/// Format timestamp for display
pub fn format_timestamp(ts: i64) -> String {
    format_local(ts, "%Y-%m-%d %H:%M:%S")
}

/// Format date for display (date only, no time)
pub fn format_date(ts: i64) -> String {
    format_local(ts, "%Y-%m-%d")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats() {
        let ts = Local.with_ymd_and_hms(2025, 3, 4, 9, 30, 0).single().unwrap().timestamp();
        assert_eq!(format_timestamp(ts), "2025-03-04 09:30:00");
        assert_eq!(format_date(ts), "2025-03-04");
    }
}
