use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::time::Duration;

use crate::app::{AppState, Flow, InputEvent, Theme, transition};
use crate::sys::SudoersOps;
use crate::ui;

/// Interactive loop: draw the current state, decode one key press into an
/// [`InputEvent`], feed it to the state machine. One event is fully
/// processed (including any grant or remove call) before the next is read.
pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    sys: &dyn SudoersOps,
    theme_path: &str,
) -> Result<()> {
    let mut app = AppState::new(Theme::load_or_init(theme_path), sys.is_root());

    loop {
        terminal.draw(|f| {
            ui::render(f, &app);
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(input) = decode_key(key.code, key.modifiers) {
                        let (next, flow) = transition(app, input, sys);
                        app = next;
                        if flow == Flow::Exit {
                            break;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// Map a raw key press to a semantic input event; unbound keys are ignored.
/// This is the only place raw key codes are inspected.
pub fn decode_key(code: KeyCode, modifiers: KeyModifiers) -> Option<InputEvent> {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Some(InputEvent::Quit);
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Some(InputEvent::Quit),
        KeyCode::Up | KeyCode::Char('k') => Some(InputEvent::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(InputEvent::MoveDown),
        KeyCode::Enter => Some(InputEvent::Confirm),
        _ => None,
    }
}
