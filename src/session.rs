use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Pacing verdict for a single answered question
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Status {
    Fast,
    OnTime,
    Slow,
    Skipped,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Fast, Status::OnTime, Status::Slow, Status::Skipped];

    /// Parse the upper-case name written by `Display`
    pub fn from_name(name: &str) -> Option<Status> {
        Self::ALL
            .into_iter()
            .find(|s| s.to_string().eq_ignore_ascii_case(name.trim()))
    }
}

/// Lifecycle of the session controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Paused,
    Ended,
}

/// Classify an elapsed time against the target and warning margin.
///
/// Zero is always `Skipped`, even with a zero target. The on-time band is
/// `target - warn ..= target`; when `warn >= target` nothing is fast.
pub fn classify(elapsed: u32, target: u32, warn: u32) -> Status {
    if elapsed == 0 {
        return Status::Skipped;
    }
    let elapsed = i64::from(elapsed);
    let target = i64::from(target);
    let fast_below = target - i64::from(warn);

    if elapsed < fast_below {
        Status::Fast
    } else if elapsed <= target {
        Status::OnTime
    } else {
        Status::Slow
    }
}

/// True when the clock is in the last stretch before the target.
/// Only drives the display; it never changes classification.
pub fn in_warning_zone(elapsed: u32, target: u32, warn: u32) -> bool {
    let elapsed = i64::from(elapsed);
    let target = i64::from(target);
    elapsed >= target - i64::from(warn) && elapsed < target
}

/// One row of the session log, written when a question is left behind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub number: u32,
    pub elapsed_seconds: u32,
    pub status: Status,
    pub marked: bool,
    pub note: String,
}

/// A finished (or in-progress) timed test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub exam_name: String,
    pub started_at: DateTime<Local>,
    pub results: Vec<QuestionResult>,
    pub target_seconds: u32,
    pub warning_margin: u32,
}

impl Session {
    pub fn stats(&self) -> crate::stats::SessionStats {
        crate::stats::summarize(&self.results, self.target_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_always_skipped() {
        assert_eq!(classify(0, 25, 10), Status::Skipped);
        assert_eq!(classify(0, 0, 0), Status::Skipped);
        assert_eq!(classify(0, 1, 5), Status::Skipped);
    }

    #[test]
    fn test_default_bands() {
        assert_eq!(classify(1, 25, 10), Status::Fast);
        assert_eq!(classify(14, 25, 10), Status::Fast);
        assert_eq!(classify(15, 25, 10), Status::OnTime);
        assert_eq!(classify(25, 25, 10), Status::OnTime);
        assert_eq!(classify(26, 25, 10), Status::Slow);
        assert_eq!(classify(600, 25, 10), Status::Slow);
    }

    #[test]
    fn test_target_is_inclusive_upper_bound() {
        for target in 1..60 {
            assert_eq!(classify(target, target, 3), Status::OnTime);
        }
    }

    #[test]
    fn test_ontime_lower_boundary() {
        for (target, warn) in [(25, 10), (30, 5), (12, 11)] {
            assert_eq!(classify(target - warn, target, warn), Status::OnTime);
            assert_eq!(classify(target - warn - 1, target, warn), Status::Fast);
        }
    }

    #[test]
    fn test_margin_at_or_above_target_disables_fast() {
        for elapsed in 1..=10 {
            assert_eq!(classify(elapsed, 10, 10), Status::OnTime);
            assert_eq!(classify(elapsed, 10, 40), Status::OnTime);
        }
        assert_eq!(classify(11, 10, 40), Status::Slow);
    }

    #[test]
    fn test_warning_zone_excludes_target() {
        assert!(!in_warning_zone(14, 25, 10));
        assert!(in_warning_zone(15, 25, 10));
        assert!(in_warning_zone(24, 25, 10));
        assert!(!in_warning_zone(25, 25, 10));
        assert!(!in_warning_zone(26, 25, 10));
    }

    #[test]
    fn test_status_display_and_parse() {
        assert_eq!(Status::OnTime.to_string(), "ONTIME");
        assert_eq!(Status::Skipped.to_string(), "SKIPPED");
        for status in Status::ALL {
            assert_eq!(Status::from_name(&status.to_string()), Some(status));
        }
        assert_eq!(Status::from_name("ontime"), Some(Status::OnTime));
        assert_eq!(Status::from_name("late"), None);
    }

    #[test]
    fn test_status_serializes_upper_case() {
        let json = serde_json::to_string(&Status::OnTime).unwrap();
        assert_eq!(json, "\"ONTIME\"");
    }
}
