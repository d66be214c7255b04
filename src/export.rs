use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::session::Session;
use crate::util::format_mmss;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("export produced invalid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Markdown,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "md",
        }
    }

    pub fn render(&self, session: &Session) -> Result<String, ExportError> {
        match self {
            ExportFormat::Csv => to_csv(session),
            ExportFormat::Markdown => Ok(to_markdown(session)),
        }
    }
}

fn duration_cell(seconds: u64) -> String {
    format!("{} min:sec", format_mmss(u32::try_from(seconds).unwrap_or(u32::MAX)))
}

fn csv_block(rows: &[Vec<String>]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// Render the session log and its summary as CSV
pub fn to_csv(session: &Session) -> Result<String, ExportError> {
    let title = csv_block(&[vec!["# Exam Name".to_string(), session.exam_name.clone()]])?;

    let mut table = vec![[
        "Question",
        "Time (min:sec)",
        "Target (sec)",
        "Result",
        "Marked",
        "Note",
    ]
    .map(String::from)
    .to_vec()];
    table.extend(session.results.iter().map(|r| {
        vec![
            r.number.to_string(),
            duration_cell(u64::from(r.elapsed_seconds)),
            format!("{} sec", session.target_seconds),
            r.status.to_string(),
            if r.marked { "Yes" } else { "" }.to_string(),
            r.note.clone(),
        ]
    }));
    let table = csv_block(&table)?;

    let stats = session.stats();
    let summary = csv_block(&[
        vec!["# SUMMARY".to_string()],
        vec!["Total Questions".into(), stats.total_questions.to_string()],
        vec!["Total Time".into(), duration_cell(stats.total_seconds)],
        vec!["Average Time".into(), duration_cell(stats.average_seconds)],
        vec![
            "Fastest Time".into(),
            duration_cell(u64::from(stats.fastest_seconds)),
        ],
        vec![
            "Slowest Time".into(),
            duration_cell(u64::from(stats.slowest_seconds)),
        ],
        vec![
            "Completed In Target Time".into(),
            stats.within_target.to_string(),
        ],
    ])?;

    Ok(format!("{title}\n{table}\n{summary}"))
}

/// Render the session log and its summary as a Markdown document
pub fn to_markdown(session: &Session) -> String {
    let mut md = format!("# {}\n\n", session.exam_name);
    md.push_str("| # | Time (min:sec) | Target (sec) | Result | Marked | Note |\n");
    md.push_str("|---|---------------|-------------|--------|--------|------|\n");
    for r in &session.results {
        md.push_str(&format!(
            "| {} | {} | {} sec | {} | {} | {} |\n",
            r.number,
            duration_cell(u64::from(r.elapsed_seconds)),
            session.target_seconds,
            r.status,
            if r.marked { "-[x]" } else { "" },
            r.note.replace('|', "\\|"),
        ));
    }

    let stats = session.stats();
    md.push_str(&format!("\n**Total Questions:** {}\n", stats.total_questions));
    md.push_str(&format!("**Total Time:** {}\n", duration_cell(stats.total_seconds)));
    md.push_str(&format!(
        "**Average Time:** {}\n",
        duration_cell(stats.average_seconds)
    ));
    md.push_str(&format!(
        "**Fastest Time:** {}\n",
        duration_cell(u64::from(stats.fastest_seconds))
    ));
    md.push_str(&format!(
        "**Slowest Time:** {}\n",
        duration_cell(u64::from(stats.slowest_seconds))
    ));
    md.push_str(&format!(
        "**Completed In Target Time:** {}\n",
        stats.within_target
    ));
    md
}

/// `test_timer_log_<date><exam name>.<ext>`, with path separators replaced
pub fn export_file_name(session: &Session, format: ExportFormat) -> String {
    let name: String = session
        .exam_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!(
        "test_timer_log_{}{}.{}",
        session.started_at.format("%Y-%m-%d"),
        name,
        format.extension()
    )
}

/// Write the rendered session into `dir` and return the file path
pub fn write_to_dir(
    session: &Session,
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let path = dir.join(export_file_name(session, format));
    write_to_path(session, format, &path)?;
    Ok(path)
}

pub fn write_to_path(session: &Session, format: ExportFormat, path: &Path) -> Result<(), ExportError> {
    let body = format.render(session)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, body)?;
    tracing::info!(path = %path.display(), %format, "exported session");
    Ok(())
}
