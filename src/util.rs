use chrono::{DateTime, Local};

/// Zero-padded `mm:ss`; minutes keep growing past 99
pub fn format_mmss(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Name given to a fresh session before the user edits it
pub fn default_exam_name(now: DateTime<Local>) -> String {
    format!("Test {}", now.format("%Y-%m-%d"))
}

/// Parse a user-supplied setting. Anything that is not a positive integer is rejected.
pub fn parse_positive(input: &str) -> Option<u32> {
    match input.trim().parse::<u32>() {
        Ok(v) if v > 0 => Some(v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_mmss() {
        assert_eq!(format_mmss(0), "00:00");
        assert_eq!(format_mmss(9), "00:09");
        assert_eq!(format_mmss(60), "01:00");
        assert_eq!(format_mmss(754), "12:34");
        assert_eq!(format_mmss(6000), "100:00");
    }

    #[test]
    fn test_default_exam_name() {
        let date = Local.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        assert_eq!(default_exam_name(date), "Test 2024-03-07");
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive("25"), Some(25));
        assert_eq!(parse_positive(" 40 "), Some(40));
        assert_eq!(parse_positive("0"), None);
        assert_eq!(parse_positive("-3"), None);
        assert_eq!(parse_positive("abc"), None);
        assert_eq!(parse_positive(""), None);
        assert_eq!(parse_positive("2.5"), None);
    }
}
