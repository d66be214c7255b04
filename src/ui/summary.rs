use qpace::{util::format_mmss, QuestionResult};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::{
    ui::{
        bold,
        charting::{bar_points, compute_ceiling, BAR_GAP, BAR_WIDTH},
        footer_line, status_style,
    },
    App,
};

fn mmss(seconds: u64) -> String {
    format_mmss(u32::try_from(seconds).unwrap_or(u32::MAX))
}

/// Same spelling as the CSV export
pub fn marked_cell(marked: bool) -> &'static str {
    if marked {
        "Yes"
    } else {
        ""
    }
}

/// Pure presenter for a single row of the session log
pub fn present_row(result: &QuestionResult, target_seconds: u32) -> Row<'static> {
    Row::new(vec![
        Cell::from(result.number.to_string()).style(bold()),
        Cell::from(format_mmss(result.elapsed_seconds)),
        Cell::from(format!("{target_seconds} sec")),
        Cell::from(result.status.to_string()).style(status_style(result.status)),
        Cell::from(marked_cell(result.marked)),
        Cell::from(result.note.clone()),
    ])
}

/// Render the end-of-session summary: aggregates, the log and a time chart
pub fn render_summary(app: &mut App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(2), // aggregates
            Constraint::Min(4),    // log table
            Constraint::Length(8), // chart
            Constraint::Length(1), // footer
            Constraint::Length(2), // instructions
        ])
        .split(f.area());

    let session = app.controller.session();
    let stats = session.stats();

    let title = Paragraph::new(session.exam_name.clone())
        .block(Block::default().borders(Borders::ALL).title("Summary"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let aggregates = Paragraph::new(vec![
        Line::from(format!(
            "Total Questions: {}   Total Time: {}   Average Time: {}",
            stats.total_questions,
            mmss(stats.total_seconds),
            mmss(stats.average_seconds),
        )),
        Line::from(format!(
            "Fastest: {}   Slowest: {}   Completed In Target Time: {}",
            format_mmss(stats.fastest_seconds),
            format_mmss(stats.slowest_seconds),
            stats.within_target,
        )),
    ])
    .style(bold())
    .alignment(Alignment::Center);
    f.render_widget(aggregates, chunks[1]);

    let header = Row::new(vec!["#", "Time", "Target", "Result", "Marked", "Note"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
    let rows: Vec<Row> = session
        .results
        .iter()
        .map(|r| present_row(r, session.target_seconds))
        .collect();
    let widths = [
        Constraint::Length(4),
        Constraint::Length(7),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(7),
        Constraint::Min(10),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Questions"))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .column_spacing(2);
    let last = session.results.len().checked_sub(1);
    let mut state = TableState::default().with_selected(last.map(|last| app.selected_row.min(last)));
    f.render_stateful_widget(table, chunks[2], &mut state);

    let points = bar_points(&session.results, chunks[3].width.saturating_sub(2));
    let bars: Vec<Bar> = points
        .iter()
        .map(|p| {
            Bar::default()
                .value(p.seconds)
                .label(Line::from(p.label.clone()))
                .style(status_style(p.status))
        })
        .collect();
    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title("Seconds per question"))
        .data(BarGroup::default().bars(&bars))
        .bar_width(BAR_WIDTH)
        .bar_gap(BAR_GAP)
        .max(compute_ceiling(&points, session.target_seconds));
    f.render_widget(chart, chunks[3]);

    f.render_widget(
        Paragraph::new(footer_line(app)).alignment(Alignment::Center),
        chunks[4],
    );

    let instructions = Paragraph::new(
        "(↑/↓) select  (enter) note  (n)ame  (c)sv  (d) markdown  (p) new test  (x) reset  (h)istory  (t)arget  (w)arning  (esc) quit",
    )
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    f.render_widget(instructions, chunks[5]);
}
