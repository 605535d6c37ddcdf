//! Pure view/render functions for the dashboard.
//!
//! Functions here take `&AppState`, draw to a ratatui `Frame`, and never
//! mutate state or return effects.
//!
//! Three views, picked from the controller snapshot:
//! - loading: no value and no error yet
//! - unavailable: the first read failed, only a retry hint is offered
//! - dashboard: the value is known and the switch is shown

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use sitectl_core::status::{Status, StatusError};
use unicode_width::UnicodeWidthStr;

use crate::state::AppState;

const HEADER_HEIGHT: u16 = 3;
const CARD_HEIGHT: u16 = 8;
const PLACEHOLDER_HEIGHT: u16 = 4;
const STATS_HEIGHT: u16 = 4;
const FOOTER_HEIGHT: u16 = 1;

/// Number of sites this dashboard manages.
const SITE_COUNT: u8 = 1;

/// Renders the entire dashboard to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();
    match (app.site.status(), &app.site.last_error) {
        (Some(status), _) => render_dashboard(app, status, frame, area),
        (None, Some(error)) => render_unavailable(error, frame, area),
        (None, None) => render_loading(app, frame, area),
    }
}

fn render_loading(app: &AppState, frame: &mut Frame, area: Rect) {
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Fill(1),
    ])
    .areas(area);
    let line = Line::from(vec![
        Span::styled(app.spinner(), Style::default().fg(Color::Cyan)),
        Span::raw(" Loading dashboard..."),
    ]);
    frame.render_widget(
        Paragraph::new(line).alignment(Alignment::Center),
        middle,
    );
}

fn render_unavailable(error: &StatusError, frame: &mut Frame, area: Rect) {
    let [body, footer] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(FOOTER_HEIGHT)]).areas(area);
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(7),
        Constraint::Fill(1),
    ])
    .areas(body);

    let lines = vec![
        Line::from(Span::styled(
            "Status unavailable",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(error.message.clone()),
        Line::default(),
        Line::from(Span::styled(
            "press r to retry",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::bordered()),
        middle,
    );
    render_hints(frame, footer, &[("r", "retry"), ("q", "quit")]);
}

fn render_dashboard(app: &AppState, status: Status, frame: &mut Frame, area: Rect) {
    let [header, card, placeholders, stats, message, _, footer] = Layout::vertical([
        Constraint::Length(HEADER_HEIGHT),
        Constraint::Length(CARD_HEIGHT),
        Constraint::Length(PLACEHOLDER_HEIGHT),
        Constraint::Length(STATS_HEIGHT),
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(FOOTER_HEIGHT),
    ])
    .areas(area);

    render_header(app, frame, header);
    render_site_card(app, status, frame, card);
    render_placeholders(frame, placeholders);
    render_stats(status, frame, stats);
    render_message(app, frame, message);

    if app.site.pending {
        render_hints(frame, footer, &[("q", "quit")]);
    } else {
        render_hints(
            frame,
            footer,
            &[("space", "toggle"), ("r", "refresh"), ("q", "quit")],
        );
    }
}

fn render_header(app: &AppState, frame: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled("Website Manager", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(
            format!(" {SITE_COUNT} Website "),
            Style::default().fg(Color::Black).bg(Color::Blue),
        ),
        Span::raw("  "),
        Span::styled(app.endpoint.clone(), Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line).block(Block::bordered()), area);
}

fn status_badge(status: Status) -> Span<'static> {
    let bg = if status.is_live {
        Color::Green
    } else {
        Color::Yellow
    };
    Span::styled(
        format!(" {} ", status.label()),
        Style::default()
            .fg(Color::Black)
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    )
}

fn switch(status: Status, pending: bool) -> Span<'static> {
    let (text, color) = if status.is_live {
        ("[ ON ]", Color::Green)
    } else {
        ("[ OFF ]", Color::Red)
    };
    let mut style = Style::default().fg(color).add_modifier(Modifier::BOLD);
    if pending {
        style = style.add_modifier(Modifier::DIM);
    }
    Span::styled(text, style)
}

/// Puts `left` at the start and `right` at the end of a line `width` wide.
fn spread(left: &str, left_style: Style, right: Span<'static>, width: u16) -> Line<'static> {
    let used = left.width() + right.content.width();
    let gap = usize::from(width).saturating_sub(used).max(1);
    Line::from(vec![
        Span::styled(left.to_string(), left_style),
        Span::raw(" ".repeat(gap)),
        right,
    ])
}

fn render_site_card(app: &AppState, status: Status, frame: &mut Frame, area: Rect) {
    let block = Block::bordered().title(format!(" {} ", app.site_name));
    let inner_width = block.inner(area).width;

    let mut lines = vec![
        Line::from(vec![Span::raw("Status  "), status_badge(status)]),
        Line::default(),
        spread(
            "Maintenance Mode",
            Style::default().add_modifier(Modifier::BOLD),
            switch(status, app.site.pending),
            inner_width,
        ),
        Line::from(Span::styled(
            status.description(),
            Style::default().fg(Color::Gray),
        )),
    ];
    if let Some(updated) = app.site.last_updated {
        lines.push(Line::from(Span::styled(
            format!("Last updated {}", updated.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        )));
    }
    if app.site.pending {
        lines.push(Line::from(vec![
            Span::styled(app.spinner(), Style::default().fg(Color::Cyan)),
            Span::raw(" Updating status..."),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_placeholders(frame: &mut Frame, area: Rect) {
    let columns: [Rect; 2] =
        Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).areas(area);
    for column in columns {
        let lines = vec![
            Line::from("+ Add Website"),
            Line::from(Span::styled(
                "Coming Soon",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .block(Block::bordered().border_style(Style::default().fg(Color::DarkGray))),
            column,
        );
    }
}

fn render_stats(status: Status, frame: &mut Frame, area: Rect) {
    let live = u8::from(status.is_live);
    let stats = [
        ("Total Websites", SITE_COUNT, Color::Blue),
        ("Live Sites", live, Color::Green),
        ("Under Maintenance", SITE_COUNT - live, Color::Yellow),
    ];
    let columns: [Rect; 3] = Layout::horizontal([Constraint::Fill(1); 3]).areas(area);
    for ((title, value, color), column) in stats.into_iter().zip(columns) {
        let line = Line::from(Span::styled(
            value.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(
            Paragraph::new(line).block(Block::bordered().title(format!(" {title} "))),
            column,
        );
    }
}

fn render_message(app: &AppState, frame: &mut Frame, area: Rect) {
    let line = if let Some(notice) = &app.notice {
        Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(error) = &app.site.last_error {
        Line::from(Span::styled(
            format!("Last request failed: {error}"),
            Style::default().fg(Color::Red),
        ))
    } else {
        return;
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_hints(frame: &mut Frame, area: Rect, hints: &[(&str, &str)]) {
    let mut spans = Vec::with_capacity(hints.len() * 3);
    for (i, (key, action)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" · ", Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(
            (*key).to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" {action}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use sitectl_core::sync::{Cached, SyncState};

    use super::*;

    fn draw(app: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(90, 30)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let area = buffer.area;
        let mut content = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                content.push_str(buffer[(x, y)].symbol());
            }
            content.push('\n');
        }
        content
    }

    fn known(status: Status) -> AppState {
        let mut app = AppState::new("Main Website", "http://localhost:3000");
        app.site = SyncState {
            cached: Cached::Known(status),
            last_updated: Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 15).single(),
            ..Default::default()
        };
        app
    }

    #[test]
    fn test_loading_view_has_no_switch() {
        let app = AppState::new("Main Website", "http://localhost:3000");
        let screen = draw(&app);
        assert!(screen.contains("Loading dashboard..."));
        assert!(!screen.contains("[ ON ]"));
        assert!(!screen.contains("[ OFF ]"));
    }

    #[test]
    fn test_unavailable_view_offers_retry() {
        let mut app = AppState::new("Main Website", "http://localhost:3000");
        app.site.last_error = Some(StatusError::rejected(503, "{\"error\":\"database offline\"}"));
        let screen = draw(&app);
        assert!(screen.contains("Status unavailable"));
        assert!(screen.contains("HTTP 503: database offline"));
        assert!(screen.contains("press r to retry"));
        assert!(!screen.contains("[ ON ]"));
        assert!(!screen.contains("[ OFF ]"));
    }

    #[test]
    fn test_live_dashboard() {
        let screen = draw(&known(Status::LIVE));
        assert!(screen.contains("Website Manager"));
        assert!(screen.contains("1 Website"));
        assert!(screen.contains("Main Website"));
        assert!(screen.contains(" Live "));
        assert!(screen.contains("Website is live and accessible"));
        assert!(screen.contains("[ ON ]"));
        assert!(screen.contains("Last updated 09:30:15"));
        assert!(screen.contains("Coming Soon"));
        assert!(screen.contains("Live Sites"));
        assert!(!screen.contains("Updating status..."));
    }

    #[test]
    fn test_maintenance_dashboard_while_pending() {
        let mut app = known(Status::MAINTENANCE);
        app.site.pending = true;
        let screen = draw(&app);
        assert!(screen.contains(" Maintenance "));
        assert!(screen.contains("Website is under maintenance"));
        assert!(screen.contains("[ OFF ]"));
        assert!(screen.contains("Updating status..."));
        assert!(!screen.contains("toggle"));
    }

    #[test]
    fn test_error_line_keeps_value_visible() {
        let mut app = known(Status::LIVE);
        app.site.last_error = Some(StatusError::network("Connection failed"));
        let screen = draw(&app);
        assert!(screen.contains("[ ON ]"));
        assert!(screen.contains("Last request failed: Connection failed"));
    }
}
