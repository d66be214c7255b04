pub mod charting;
pub mod history;
pub mod screen;
pub mod summary;

use qpace::{util::format_mmss, Phase, Status};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{App, EditTarget};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

pub fn status_style(status: Status) -> Style {
    match status {
        Status::Fast => Style::default().fg(Color::Green),
        Status::OnTime => Style::default().fg(Color::Cyan),
        Status::Slow => Style::default().fg(Color::Red),
        Status::Skipped => Style::default().fg(Color::DarkGray),
    }
}

/// Prompt line for whatever text is being typed in, if any
pub fn edit_line(app: &App) -> Option<Line<'static>> {
    let edit = app.edit.as_ref()?;
    let label = match edit.target {
        EditTarget::Note(number) => format!("Note for Q{number}: "),
        EditTarget::ExamName => "Exam name: ".to_string(),
        EditTarget::HistoryName(_) => "Rename to: ".to_string(),
        EditTarget::Target => "Target seconds: ".to_string(),
        EditTarget::Warning => "Warning margin seconds: ".to_string(),
    };
    Some(Line::from(vec![
        Span::styled(label, bold().fg(Color::Yellow)),
        Span::raw(edit.text.clone()),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        Span::styled("   (enter) save  (esc) cancel", dim()),
    ]))
}

/// Edit prompt if one is open, otherwise the latest status message
pub fn footer_line(app: &App) -> Line<'static> {
    edit_line(app).unwrap_or_else(|| {
        Line::from(Span::styled(
            app.message.clone().unwrap_or_default(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ))
    })
}

/// Timer screen
impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let c = &self.controller;
        let settings = c.session_settings();
        let phase = c.phase();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // exam name and phase
                Constraint::Min(1),    // spacer
                Constraint::Length(1), // question
                Constraint::Length(1), // clock
                Constraint::Length(1), // target
                Constraint::Length(1), // padding
                Constraint::Length(1), // last recorded
                Constraint::Min(1),    // spacer
                Constraint::Length(1), // live stats
                Constraint::Length(1), // footer
                Constraint::Length(1), // legend
            ])
            .split(area);

        let phase_label = phase.to_string().to_uppercase();
        let phase_style = match phase {
            Phase::Idle => dim(),
            Phase::Running => bold().fg(Color::Green),
            Phase::Paused => bold().fg(Color::Yellow),
            Phase::Ended => bold().fg(Color::Magenta),
        };
        // pad the name so the phase sits at the right edge
        let name = c.exam_name();
        let gap = (chunks[0].width as usize)
            .saturating_sub(name.width() + phase_label.width())
            .max(1);
        Paragraph::new(Line::from(vec![
            Span::styled(name.to_string(), bold()),
            Span::raw(" ".repeat(gap)),
            Span::styled(phase_label, phase_style),
        ]))
        .render(chunks[0], buf);

        let mut question = vec![Span::styled(
            format!("Question {}", c.current_question()),
            bold(),
        )];
        if c.is_marked() {
            question.push(Span::styled("  [marked]", bold().fg(Color::Magenta)));
        }
        Paragraph::new(Line::from(question))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);

        let clock_style = if phase == Phase::Paused {
            dim().add_modifier(Modifier::BOLD)
        } else if c.elapsed() > settings.target_seconds && phase == Phase::Running {
            bold().fg(Color::Red)
        } else if c.in_warning_zone() {
            bold().fg(Color::Yellow)
        } else {
            bold()
        };
        Paragraph::new(Span::styled(format_mmss(c.elapsed()), clock_style))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        Paragraph::new(Span::styled(
            format!(
                "target {}  (fast under {}s)",
                format_mmss(settings.target_seconds),
                settings
                    .target_seconds
                    .saturating_sub(settings.warning_margin)
            ),
            dim(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

        if let Some(last) = &self.last_recorded {
            Paragraph::new(Line::from(vec![
                Span::raw(format!(
                    "Q{} {}  ",
                    last.number,
                    format_mmss(last.elapsed_seconds)
                )),
                Span::styled(last.status.to_string(), status_style(last.status)),
            ]))
            .alignment(Alignment::Center)
            .render(chunks[6], buf);
        } else if phase == Phase::Idle {
            Paragraph::new(Span::styled(
                "press (p) or (space) to start",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .render(chunks[6], buf);
        }

        let live = c.live_stats();
        Paragraph::new(Span::styled(
            format!(
                "done {}   total {}   avg {}   marked {}",
                live.questions_done,
                format_mmss(u32::try_from(live.total_seconds).unwrap_or(u32::MAX)),
                format_mmss(u32::try_from(live.average_seconds).unwrap_or(u32::MAX)),
                live.marked
            ),
            bold(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[8], buf);

        Paragraph::new(footer_line(self))
            .alignment(Alignment::Center)
            .render(chunks[9], buf);

        Paragraph::new(Span::styled(
            "(p) start/pause  (space) next  (s)kip  (m)ark  (r)eset time  (e)nd  (x) reset all  (h)istory  (t)arget  (w)arning  (esc) quit",
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .wrap(Wrap { trim: true })
        .render(chunks[10], buf);
    }
}
