//! nosudopass binary entry point.
//!
//! Parses the CLI, initializes logging and the terminal in raw mode, runs
//! the interactive loop, and restores the terminal state on exit.
//!
use crate::error::Result;
use crate::sys::SudoersOps;
use clap::Parser;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

mod app;
mod error;
mod sys;
mod ui;

/// Grant or revoke passwordless sudo via /etc/sudoers.d drop-in files.
#[derive(Parser, Debug)]
#[command(name = "nosudopass", version, about)]
struct Cli {
    /// Theme configuration file
    #[arg(long, env = "NOSUDOPASS_THEME", default_value = "theme.conf")]
    theme: String,
    /// Sudoers drop-in directory to manage (defaults to /etc/sudoers.d)
    #[arg(long, env = "NOSUDOPASS_SUDOERS_DIR")]
    sudoers_dir: Option<String>,
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Program entry point: run the TUI and report any top-level error to stderr.
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr and stay silent unless RUST_LOG is set; the TUI
    // owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let adapter = app::system_adapter(cli.sudoers_dir.as_deref());
    if !adapter.is_root() {
        println!("⚠ Running without root privileges. Some functions may not work.");
    }

    let mut terminal = init_terminal().map_err(|e| format!("init terminal: {}", e))?;

    let res = app::run(&mut terminal, &adapter, &cli.theme);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
    Ok(())
}
