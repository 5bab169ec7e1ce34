//! Rendering of the menu screens.
//!
//! Pure presentation: reads [`AppState`], draws it, decides nothing.
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, Screen};

pub fn render(f: &mut Frame, app: &AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(5), Constraint::Length(1)].as_ref())
        .split(f.area());

    let mut header = vec![Line::from(Span::styled(
        format!("nosudopass {}", env!("CARGO_PKG_VERSION")),
        Style::default()
            .fg(app.theme.title)
            .add_modifier(Modifier::BOLD),
    ))];
    if !app.privileged {
        header.push(Line::from(Span::styled(
            "⚠ Running without root — access to /etc is limited.",
            Style::default().fg(app.theme.warn),
        )));
    }
    let p = Paragraph::new(header).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(p, root[0]);

    let body = match app.screen {
        Screen::Confirmation => confirmation_body(app),
        _ => options_body(app),
    };
    f.render_widget(body, root[1]);

    let footer = Paragraph::new("↑/↓/k/j - move, Enter - select, q - quit")
        .style(Style::default().fg(app.theme.muted));
    f.render_widget(footer, root[2]);
}

fn screen_title(screen: Screen) -> &'static str {
    match screen {
        Screen::MainMenu => "Choose an action:",
        Screen::SelectUser => "Select a user:",
        Screen::SelectGrantFile => "Select a sudoers file to remove:",
        Screen::ConfirmDelete => "Confirm deletion:",
        Screen::Confirmation => "",
    }
}

fn options_body(app: &AppState) -> Paragraph<'_> {
    let mut lines = vec![
        Line::from(Span::styled(
            screen_title(app.screen),
            Style::default().fg(app.theme.text),
        )),
        Line::default(),
    ];
    for (i, option) in app.options.iter().enumerate() {
        let line = if i == app.cursor {
            Line::from(Span::styled(
                format!("● {option}"),
                Style::default()
                    .fg(app.theme.highlight_fg)
                    .bg(app.theme.highlight_bg)
                    .add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(Span::styled(
                format!("  {option}"),
                Style::default().fg(app.theme.text),
            ))
        };
        lines.push(line);
    }
    Paragraph::new(lines)
}

fn confirmation_body(app: &AppState) -> Paragraph<'_> {
    let lines = vec![
        Line::from(Span::styled(
            app.message.clone(),
            Style::default().fg(app.theme.text),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Press Enter to return to menu.",
            Style::default().fg(app.theme.muted),
        )),
    ];
    Paragraph::new(lines)
}
