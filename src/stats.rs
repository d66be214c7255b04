use crate::session::QuestionResult;

/// Aggregates over a session log, as shown in the summary and exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub total_questions: usize,
    pub total_seconds: u64,
    /// Floor of the mean elapsed time
    pub average_seconds: u64,
    pub fastest_seconds: u32,
    pub slowest_seconds: u32,
    /// Results with `elapsed <= target`, skipped questions included
    pub within_target: usize,
}

/// Compute the summary aggregates from results and the session's target.
/// An empty log yields all zeros.
pub fn summarize(results: &[QuestionResult], target_seconds: u32) -> SessionStats {
    let total_questions = results.len();
    let total_seconds: u64 = results.iter().map(|r| u64::from(r.elapsed_seconds)).sum();
    let average_seconds = match total_questions {
        0 => 0,
        n => total_seconds / n as u64,
    };

    SessionStats {
        total_questions,
        total_seconds,
        average_seconds,
        fastest_seconds: results.iter().map(|r| r.elapsed_seconds).min().unwrap_or(0),
        slowest_seconds: results.iter().map(|r| r.elapsed_seconds).max().unwrap_or(0),
        within_target: results
            .iter()
            .filter(|r| r.elapsed_seconds <= target_seconds)
            .count(),
    }
}

/// Running figures displayed under the timer while a session is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LiveStats {
    pub current_question: u32,
    pub questions_done: usize,
    pub total_seconds: u64,
    pub average_seconds: u64,
    /// Marked results plus the current question if it is marked
    pub marked: usize,
}
