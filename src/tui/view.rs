use crate::model::Snapshot;
use crate::tui::state::{Phase, UiState, FOOTER_HEIGHT, HEADER_HEIGHT};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use time::macros::format_description;

/// Styles used by the renderer. Built once per render loop and passed down.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub header_left: Style,
    pub header_right: Style,
    pub body: Style,
    pub rule: Style,
    pub info: Style,
    pub info_border: Style,
    pub placeholder: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header_left: Style::default().add_modifier(Modifier::BOLD),
            header_right: Style::default().fg(Color::Gray),
            body: Style::default(),
            rule: Style::default().fg(Color::DarkGray),
            info: Style::default().fg(Color::Cyan),
            info_border: Style::default().fg(Color::DarkGray),
            placeholder: Style::default().fg(Color::Gray),
        }
    }
}

pub fn draw(f: &mut Frame, state: &UiState, theme: &Theme) {
    let area = f.area();
    if state.phase() != Phase::Ready {
        let p = Paragraph::new("Initializing...").style(theme.placeholder);
        f.render_widget(p, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area);

    draw_header(chunks[0], f, state.snapshot(), theme);
    draw_body(chunks[1], f, state, theme);
    draw_footer(chunks[2], f, state, theme);
}

fn draw_header(area: Rect, f: &mut Frame, snapshot: &Snapshot, theme: &Theme) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    f.render_widget(
        Paragraph::new(header_title(snapshot))
            .style(theme.header_left)
            .alignment(Alignment::Left),
        halves[0],
    );
    f.render_widget(
        Paragraph::new(last_run_label(snapshot))
            .style(theme.header_right)
            .alignment(Alignment::Right),
        halves[1],
    );
}

fn draw_body(area: Rect, f: &mut Frame, state: &UiState, theme: &Theme) {
    let lines: Vec<Line> = state
        .viewport()
        .visible()
        .iter()
        .map(|l| Line::raw(l.as_str()))
        .collect();
    f.render_widget(Paragraph::new(lines).style(theme.body), area);
}

fn draw_footer(area: Rect, f: &mut Frame, state: &UiState, theme: &Theme) {
    let info = percent_label(state.viewport().scroll_percent());
    // Text plus one border column on each side.
    let info_width = info.chars().count() as u16 + 2;

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(info_width)])
        .split(area);

    let rule_row = Rect {
        y: cols[0].y + cols[0].height / 2,
        height: cols[0].height.min(1),
        ..cols[0]
    };
    f.render_widget(
        Paragraph::new("─".repeat(rule_row.width as usize)).style(theme.rule),
        rule_row,
    );

    let boxed = Paragraph::new(info).style(theme.info).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme.info_border),
    );
    f.render_widget(boxed, cols[1]);
}

pub fn header_title(snapshot: &Snapshot) -> String {
    format!(
        "Every {}: {:?}",
        humantime::format_duration(snapshot.interval),
        snapshot.command_text
    )
}

pub fn last_run_label(snapshot: &Snapshot) -> String {
    // ANSI-C layout, e.g. "Mon Jan  2 15:04:05 2006".
    let format = format_description!(
        "[weekday repr:short] [month repr:short] [day padding:space] [hour]:[minute]:[second] [year]"
    );
    match snapshot.latest.as_ref() {
        Some(run) => run
            .completed_at
            .format(format)
            .unwrap_or_else(|_| run.completed_at.to_string()),
        None => "waiting for first run".into(),
    }
}

pub fn percent_label(fraction: f64) -> String {
    format!("{:3.0}%", fraction * 100.0)
}
