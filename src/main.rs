//! Salary dashboard: a terminal explorer for job salary records.
//!
//! Loads a CSV once, then redraws filter controls and charts on every key press.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::panic;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::Show,
    event::{self, Event as CEvent, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use tui::backend::{Backend, CrosstermBackend};
use tui::Terminal;

use crate::app::App;
use crate::cli::Args;
use crate::config::{Config, LoggingConfig};

mod aggregate;
mod app;
mod cli;
mod config;
mod csv_reader;
mod dataset;
mod error;
mod filter;
mod stats;
mod ui;

enum Event<I> {
    Input(I),
    Tick,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let (mut config, config_note) = load_config(&args)?;
    config.merge_with_args(&args);

    if args.print_config {
        print!("{}", config.to_toml());
        return Ok(());
    }

    init_logging(&config.logging, config.log_level())?;
    info!("salary_dash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    if let Some(note) = config_note {
        warn!("{}", note);
    }

    let dataset = match csv_reader::read_dataset(&config.data.path) {
        Ok(dataset) => dataset,
        Err(e) => {
            error!("Failed to load {}: {}", config.data.path.display(), e);
            return Err(e).with_context(|| format!("Failed to load {}", config.data.path.display()));
        }
    };
    if dataset.is_empty() {
        warn!("{} has no records", config.data.path.display());
    }

    let mut app = App::new(&dataset, &config.dashboard);
    let tick_rate = Duration::from_millis(config.dashboard.tick_rate_ms);
    let result = run(&mut app, tick_rate);
    if let Err(ref e) = result {
        error!("Dashboard stopped: {:#}", e);
    }
    result
}

/// Explicit `--config` must load; a broken default file falls back to
/// defaults and returns a note to log once logging is up.
fn load_config(args: &Args) -> Result<(Config, Option<String>)> {
    if let Some(ref path) = args.config {
        let config = Config::load(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?;
        return Ok((config, None));
    }
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, None)),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => Ok((
            Config::default(),
            Some(format!(
                "Ignoring {}: {}",
                PathBuf::from(config::DEFAULT_CONFIG_FILE).display(),
                e
            )),
        )),
    }
}

/// Logs go to a file; stdout belongs to the dashboard.
fn init_logging(logging: &LoggingConfig, level: tracing::Level) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logging.file)
        .with_context(|| format!("Failed to open log file: {}", logging.file.display()))?;

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Takes over the terminal, runs the dashboard and always hands the terminal back.
fn run(app: &mut App, tick_rate: Duration) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        restore_terminal();
        default_hook(info);
    }));

    enable_raw_mode().context("Failed to enable raw mode")?;
    let result = run_in_terminal(app, tick_rate);
    restore_terminal();
    result
}

fn run_in_terminal(app: &mut App, tick_rate: Duration) -> Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    event_loop(&mut terminal, app, tick_rate)
}

/// Every step runs even when an earlier one fails.
fn restore_terminal() {
    if let Err(e) = disable_raw_mode() {
        warn!("Failed to disable raw mode: {}", e);
    }
    if let Err(e) = leave_screen(&mut io::stdout()) {
        warn!("Failed to leave the alternate screen: {}", e);
    }
}

fn leave_screen<W: Write>(out: &mut W) -> io::Result<()> {
    execute!(out, LeaveAlternateScreen, Show)
}

fn spawn_input(tick_rate: Duration) -> mpsc::Receiver<Event<KeyEvent>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut last_tick = Instant::now();
        loop {
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));

            match event::poll(timeout) {
                Ok(true) => {
                    if let Ok(CEvent::Key(key)) = event::read() {
                        if key.kind == KeyEventKind::Press && tx.send(Event::Input(key)).is_err() {
                            break;
                        }
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("Input polling failed: {}", e);
                    break;
                }
            }

            if last_tick.elapsed() >= tick_rate {
                if tx.send(Event::Tick).is_err() {
                    break;
                }
                last_tick = Instant::now();
            }
        }
    });
    rx
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, tick_rate: Duration) -> Result<()> {
    let rx = spawn_input(tick_rate);
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        match rx.recv()? {
            Event::Input(key) => {
                if !app.on_key(key) {
                    info!("Quit requested");
                    return Ok(());
                }
            }
            Event::Tick => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaving_the_screen_also_shows_the_cursor() {
        let mut out = Vec::new();
        leave_screen(&mut out).unwrap();
        let written = String::from_utf8(out).unwrap();
        assert!(written.contains("\x1b[?1049l"));
        assert!(written.contains("\x1b[?25h"));
    }
}
