//! Application state types and the navigation state machine.
//!
//! The interactive flow is modeled as an explicit [`AppState`] value fed
//! through the pure [`transition`] function, one [`InputEvent`] at a time.
//! Side effects (listing accounts, writing or deleting grant files) only
//! happen through the [`sys::SudoersOps`] seam, so every row of the
//! transition table is unit-testable without a terminal.
pub mod update;

use ratatui::style::Color;
use std::path::PathBuf;

use crate::sys::{self, SudoersOps};

/// The screen currently shown by the TUI.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    MainMenu,
    SelectUser,
    SelectGrantFile,
    ConfirmDelete,
    Confirmation,
}

/// Discrete input events, decoded once at the input boundary.
/// The state machine never sees raw key codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    MoveUp,
    MoveDown,
    Confirm,
    Quit,
}

/// Which privileged flow is in progress.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PendingAction {
    None,
    Add,
    Remove,
}

/// Whether the interactive loop should keep running after a transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Main menu entries, in cursor order.
pub const MAIN_MENU: [&str; 3] = [
    "Allow sudo without password",
    "Disable sudo without password",
    "Exit",
];

/// First entry of every selection list.
pub const BACK_LABEL: &str = "⬅ Back";

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub warn: Color,
}

impl Theme {
    /// Dark default theme.
    #[allow(dead_code)]
    pub fn dark() -> Self {
        Self {
            text: Color::Gray,
            muted: Color::DarkGray,
            title: Color::Cyan,
            border: Color::Gray,
            highlight_fg: Color::Yellow,
            highlight_bg: Color::Reset,
            warn: Color::Red,
        }
    }

    /// Catppuccin Mocha theme defaults.
    pub fn mocha() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),         // text
            muted: Color::Rgb(0x7f, 0x84, 0x9c),        // overlay1
            title: Color::Rgb(0xcb, 0xa6, 0xf7),        // mauve
            border: Color::Rgb(0x58, 0x5b, 0x70),       // surface2
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf), // yellow
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a), // surface1
            warn: Color::Rgb(0xf3, 0x8b, 0xa8),         // red
        }
    }

    /// Load theme from a simple key=value file. Unknown or missing keys fall back to `mocha`.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        let mut theme = Self::mocha();

        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let key = parts.next().map(|s| s.trim()).unwrap_or("");
            let val = parts.next().map(|s| s.trim()).unwrap_or("");
            if key.is_empty() || val.is_empty() {
                continue;
            }
            if let Some(color) = Self::parse_color(val) {
                match key {
                    "text" => theme.text = color,
                    "muted" => theme.muted = color,
                    "title" => theme.title = color,
                    "border" => theme.border = color,
                    "highlight_fg" => theme.highlight_fg = color,
                    "highlight_bg" => theme.highlight_bg = color,
                    "warn" => theme.warn = color,
                    _ => {}
                }
            }
        }

        Some(theme)
    }

    /// Parse a color from hex ("#RRGGBB" or "RRGGBB") or the special name "reset".
    fn parse_color(s: &str) -> Option<Color> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "reset" {
            return Some(Color::Reset);
        }
        let hex = lower.strip_prefix('#').unwrap_or(lower.as_str());
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Some(Color::Rgb(r, g, b));
            }
        }
        None
    }

    /// Persist the theme to a config file in key=value format.
    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;

        fn color_to_str(c: Color) -> String {
            match c {
                Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
                Color::Reset => "reset".to_string(),
                Color::Yellow => "#FFFF00".to_string(),
                Color::Cyan => "#00FFFF".to_string(),
                Color::Red => "#FF0000".to_string(),
                Color::Gray => "#B3B3B3".to_string(),
                Color::DarkGray => "#4D4D4D".to_string(),
                other => format!("{:?}", other).to_lowercase(),
            }
        }

        let mut buf = String::new();
        buf.push_str("# nosudopass theme configuration\n");
        buf.push_str("# Colors: hex as #RRGGBB or RRGGBB, or 'reset'\n\n");
        let mut kv = |k: &str, v: Color| {
            let _ = writeln!(&mut buf, "{} = {}", k, color_to_str(v));
        };
        kv("text", self.text);
        kv("muted", self.muted);
        kv("title", self.title);
        kv("border", self.border);
        kv("highlight_fg", self.highlight_fg);
        kv("highlight_bg", self.highlight_bg);
        kv("warn", self.warn);

        std::fs::write(path, buf)
    }

    /// Ensure a config file exists; if missing, write one with the default theme
    /// and return it. If present, load from it; on parse errors, return `mocha`.
    pub fn load_or_init(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_else(Self::mocha);
        }
        let t = Self::mocha();
        let _ = t.write_file(path);
        t
    }
}

pub struct AppState {
    pub screen: Screen,
    /// Choices shown on the current screen, addressed by `cursor`.
    pub options: Vec<String>,
    /// Always within `0..options.len()` while `options` is non-empty.
    pub cursor: usize,
    pub users: Vec<String>,
    pub grant_files: Vec<PathBuf>,
    pub selected_grant_file: Option<PathBuf>,
    pub pending: PendingAction,
    pub message: String,
    /// Privilege snapshot taken at startup, used for the warning banner only.
    /// Privileged actions re-check live via [`SudoersOps::is_root`].
    pub privileged: bool,
    pub theme: Theme,
}

impl AppState {
    pub fn new(theme: Theme, privileged: bool) -> Self {
        Self {
            screen: Screen::MainMenu,
            options: MAIN_MENU.iter().map(|s| s.to_string()).collect(),
            cursor: 0,
            users: Vec::new(),
            grant_files: Vec::new(),
            selected_grant_file: None,
            pending: PendingAction::None,
            message: String::new(),
            privileged,
            theme,
        }
    }

    /// Reset to main menu defaults: message, pending action and selection
    /// are cleared, the cursor returns to the top.
    fn back_to_main(&mut self) {
        self.screen = Screen::MainMenu;
        self.options = MAIN_MENU.iter().map(|s| s.to_string()).collect();
        self.cursor = 0;
        self.message.clear();
        self.pending = PendingAction::None;
        self.selected_grant_file = None;
    }
}

/// Advance the state machine by one input event.
///
/// Cursor movement clamps at both ends and never wraps. `Confirm` may call
/// into `sys`; every outcome of such a call lands on the Confirmation
/// screen, from which one more confirm returns to the main menu. Errors are
/// terminal to the operation, never to the process.
pub fn transition(mut app: AppState, event: InputEvent, sys: &dyn SudoersOps) -> (AppState, Flow) {
    match event {
        InputEvent::Quit => return (app, Flow::Exit),
        InputEvent::MoveUp => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        InputEvent::MoveDown => {
            if app.cursor + 1 < app.options.len() {
                app.cursor += 1;
            }
        }
        InputEvent::Confirm => return confirm(app, sys),
    }
    (app, Flow::Continue)
}

fn confirm(mut app: AppState, sys: &dyn SudoersOps) -> (AppState, Flow) {
    match app.screen {
        Screen::MainMenu => match app.cursor {
            0 => {
                if !sys.is_root() {
                    app.message = "❌ Root privileges required to modify sudoers.".to_string();
                    app.screen = Screen::Confirmation;
                    return (app, Flow::Continue);
                }
                app.users = sys.list_users();
                if app.users.is_empty() {
                    app.message = "No users with home directories found.".to_string();
                    app.screen = Screen::Confirmation;
                    return (app, Flow::Continue);
                }
                app.options = std::iter::once(BACK_LABEL.to_string())
                    .chain(app.users.iter().cloned())
                    .collect();
                app.cursor = 0;
                app.pending = PendingAction::Add;
                app.screen = Screen::SelectUser;
            }
            1 => {
                if !sys.is_root() {
                    app.message =
                        "❌ Root privileges required to remove sudoers files.".to_string();
                    app.screen = Screen::Confirmation;
                    return (app, Flow::Continue);
                }
                app.grant_files = sys.list_grant_files();
                if app.grant_files.is_empty() {
                    app.message = "No sudoers files to remove.".to_string();
                    app.screen = Screen::Confirmation;
                    return (app, Flow::Continue);
                }
                app.options = std::iter::once(BACK_LABEL.to_string())
                    .chain(app.grant_files.iter().map(|p| p.display().to_string()))
                    .collect();
                app.cursor = 0;
                app.pending = PendingAction::Remove;
                app.screen = Screen::SelectGrantFile;
            }
            _ => return (app, Flow::Exit),
        },
        Screen::SelectUser => {
            if app.cursor == 0 {
                app.back_to_main();
                return (app, Flow::Continue);
            }
            let Some(user) = app.users.get(app.cursor - 1).cloned() else {
                app.back_to_main();
                return (app, Flow::Continue);
            };
            app.message = match sys.grant(&user) {
                Ok(()) => format!("User {user} can now run sudo without password."),
                Err(e) => format!("Error: {e}"),
            };
            app.screen = Screen::Confirmation;
        }
        Screen::SelectGrantFile => {
            if app.cursor == 0 {
                app.back_to_main();
                return (app, Flow::Continue);
            }
            let Some(file) = app.grant_files.get(app.cursor - 1).cloned() else {
                app.back_to_main();
                return (app, Flow::Continue);
            };
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            app.options = vec![format!("Delete {name}"), "Cancel".to_string()];
            app.cursor = 0;
            app.selected_grant_file = Some(file);
            app.screen = Screen::ConfirmDelete;
        }
        Screen::ConfirmDelete => {
            if app.cursor == 0 {
                if let Some(path) = app.selected_grant_file.take() {
                    app.message = match sys.remove_grant(&path) {
                        Ok(()) => format!("File deleted: {}", path.display()),
                        Err(e) => format!("Error deleting: {e}"),
                    };
                    app.screen = Screen::Confirmation;
                } else {
                    app.back_to_main();
                }
            } else {
                app.back_to_main();
            }
        }
        Screen::Confirmation => app.back_to_main(),
    }
    (app, Flow::Continue)
}

/// Construct the real system adapter honoring an optional drop-in
/// directory override from the CLI.
pub fn system_adapter(sudoers_dir: Option<&str>) -> sys::SudoersAdapter {
    match sudoers_dir {
        Some(dir) => sys::SudoersAdapter::with_sudoers_dir(dir),
        None => sys::SudoersAdapter::new(),
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
