use qpace::{QuestionResult, Status};

pub const BAR_WIDTH: u16 = 3;
pub const BAR_GAP: u16 = 1;

/// One bar of the per-question time chart
#[derive(Debug, Clone, PartialEq)]
pub struct BarPoint {
    pub label: String,
    pub seconds: u64,
    pub status: Status,
}

/// Bars for the most recent questions that fit into `width` columns
pub fn bar_points(results: &[QuestionResult], width: u16) -> Vec<BarPoint> {
    let fits = usize::from(width / (BAR_WIDTH + BAR_GAP)).max(1);
    let skip = results.len().saturating_sub(fits);
    results
        .iter()
        .skip(skip)
        .map(|r| BarPoint {
            label: r.number.to_string(),
            seconds: u64::from(r.elapsed_seconds),
            status: r.status,
        })
        .collect()
}

/// Top of the Y axis: the slowest bar or the target, whichever is higher
pub fn compute_ceiling(points: &[BarPoint], target_seconds: u32) -> u64 {
    points
        .iter()
        .map(|p| p.seconds)
        .max()
        .unwrap_or(0)
        .max(u64::from(target_seconds))
        .max(1)
}
