use qpace::{util::format_mmss, Session};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::{
    ui::{bold, footer_line},
    App,
};

/// Pure presenter for one stored session
pub fn present_row(index: usize, session: &Session) -> Row<'static> {
    let stats = session.stats();
    let on_target = if stats.total_questions == 0 {
        0.0
    } else {
        stats.within_target as f64 * 100.0 / stats.total_questions as f64
    };
    let on_target_color = if on_target >= 80.0 {
        Color::Green
    } else if on_target >= 50.0 {
        Color::Yellow
    } else {
        Color::Red
    };

    Row::new(vec![
        Cell::from(index.to_string()).style(Style::default().add_modifier(Modifier::DIM)),
        Cell::from(session.exam_name.clone()).style(bold()),
        Cell::from(session.started_at.format("%Y-%m-%d %H:%M").to_string()),
        Cell::from(stats.total_questions.to_string()),
        Cell::from(format_mmss(u32::try_from(stats.total_seconds).unwrap_or(u32::MAX))),
        Cell::from(format_mmss(u32::try_from(stats.average_seconds).unwrap_or(u32::MAX))),
        Cell::from(format!("{on_target:.0}%")).style(Style::default().fg(on_target_color)),
    ])
}

/// Render past sessions, newest first
pub fn render_history(app: &mut App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(0),    // sessions
            Constraint::Length(1), // footer
            Constraint::Length(2), // instructions
        ])
        .split(f.area());

    let title = Paragraph::new(format!("{} stored sessions", app.history.sessions.len()))
        .block(Block::default().borders(Borders::ALL).title("History"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    if app.history.sessions.is_empty() {
        let no_data = Paragraph::new("No past tests found.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(no_data, chunks[1]);
    } else {
        let header = Row::new(vec![
            "#", "Exam", "Started", "Qs", "Total", "Avg", "In target",
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = app
            .history
            .sessions
            .iter()
            .enumerate()
            .rev()
            .map(|(i, s)| present_row(i, s))
            .collect();

        let widths = [
            Constraint::Length(4),
            Constraint::Min(16),
            Constraint::Length(17),
            Constraint::Length(4),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(10),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Sessions"))
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .column_spacing(2);
        let mut state = TableState::default().with_selected(Some(app.history.selected));
        f.render_stateful_widget(table, chunks[1], &mut state);
    }

    f.render_widget(
        Paragraph::new(footer_line(app)).alignment(Alignment::Center),
        chunks[2],
    );

    let instructions = Paragraph::new(
        "(↑/↓) select  (r)ename  (d)elete  (c)sv  (k) markdown  (esc/b) back",
    )
    .alignment(Alignment::Center)
    .wrap(ratatui::widgets::Wrap { trim: true });
    f.render_widget(instructions, chunks[3]);
}
