mod app;
mod cli;
mod domain;
mod infra;
mod ui;

use crate::app::{AppCommand, AppEvent, AppModel, SyncResult};
use crate::cli::CliInvocation;
use crate::infra::{AppConfig, init_logging, resolve_assetbox_state_dir, run_sync};
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind,
};
use crossterm::terminal::size as terminal_size;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{ExecutableCommand, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout, Write};
use std::sync::mpsc::{Sender, channel};
use std::time::Duration;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    App(#[from] crate::app::AppError),

    #[error(transparent)]
    Cli(#[from] crate::cli::CliRunError),

    #[error(transparent)]
    Config(#[from] crate::infra::ConfigError),
}

#[derive(Debug)]
enum SyncSignal {
    Finished { generation: u64, result: SyncResult },
}

fn main() {
    if let Err(error) = run_main() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{error}");
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(())
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliInvocation::Tui { overrides } => {
            let config = AppConfig::from_env(overrides)?;
            let (_guard, logging_notice) = start_logging();
            Ok(run_tui(config, logging_notice)?)
        }
        CliInvocation::Command { overrides, command } => {
            let config = AppConfig::from_env(overrides)?;
            let (_guard, logging_notice) = start_logging();
            write_logging_notice(&mut io::stderr().lock(), logging_notice.as_deref());
            crate::cli::run(command, &config)?;
            Ok(())
        }
    }
}

/// Logging is best effort: without a state dir the app still runs, it just says so.
fn start_logging() -> (Option<WorkerGuard>, Option<String>) {
    let state_dir = match resolve_assetbox_state_dir() {
        Ok(dir) => dir,
        Err(error) => return (None, Some(format!("Logging disabled: {error}"))),
    };
    match init_logging(&state_dir) {
        Ok(guard) => (Some(guard), None),
        Err(error) => (None, Some(format!("Logging disabled: {error}"))),
    }
}

fn write_logging_notice(err: &mut impl Write, notice: Option<&str>) {
    if let Some(notice) = notice {
        let _ = writeln!(err, "{notice}");
    }
}

fn print_help() {
    let text = format!(
        "{name} - browse the latest hardware/software snapshot per asset owner\n\nUSAGE:\n  {name} [FLAGS]                 Start the TUI (syncs on start, Ctrl+R to resync)\n  {name} [FLAGS] resolve         List and resolve snapshot files without fetching\n  {name} [FLAGS] list [query]    Sync and print one line per owner (filtered by owner name)\n  {name} [FLAGS] show <owner>    Sync and print one owner's snapshot as JSON\n  {name} --help | --version\n\nFLAGS:\n  --server URL          Records server (default: {server})\n  --listing-path PATH   Listing endpoint under the server (default: {listing})\n  --records-path PATH   File endpoint under the server (default: {records})\n  --records-dir DIR     Read a local records directory instead of a server\n  --timeout SECS        Per-request timeout (default: {timeout})\n\nOUTPUT:\n  resolve: owner<TAB>timestamp<TAB>filename\n  list:    owner<TAB>hostname<TAB>manufacturer model<TAB>os<TAB>timestamp\n\nENV:\n  ASSETBOX_SERVER, ASSETBOX_LISTING_PATH, ASSETBOX_RECORDS_PATH, ASSETBOX_RECORDS_DIR,\n  ASSETBOX_TIMEOUT_SECS  Same as the flags above (flags win)\n  ASSETBOX_STATE_DIR     State dir for logs (default: ~/.assetbox)\n  ASSETBOX_LOG           Log filter, e.g. debug (falls back to RUST_LOG, then info)\n",
        name = env!("CARGO_PKG_NAME"),
        server = crate::infra::DEFAULT_SERVER,
        listing = crate::infra::DEFAULT_LISTING_PATH,
        records = crate::infra::DEFAULT_RECORDS_PATH,
        timeout = crate::infra::DEFAULT_TIMEOUT_SECS,
    );
    let mut out = io::stdout().lock();
    let _ = write!(out, "{text}");
}

fn run_tui(config: AppConfig, notice: Option<String>) -> Result<(), crate::app::AppError> {
    let mut model = AppModel::new(config.source_label()).with_notice(notice);
    let mut terminal = setup_terminal()?;
    if let Ok((width, height)) = terminal_size() {
        model = model.with_terminal_size(width, height);
    }
    let result = run(&mut terminal, model, &config);
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, app::AppError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let _ = stdout.execute(EnableBracketedPaste);
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<(), app::AppError> {
    disable_raw_mode()?;
    let _ = execute!(terminal.backend_mut(), DisableBracketedPaste);
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut model: AppModel,
    config: &AppConfig,
) -> Result<(), app::AppError> {
    let (sync_tx, sync_rx) = channel::<SyncSignal>();
    if let Some(generation) = model.begin_sync() {
        spawn_sync(config, generation, sync_tx.clone());
    }

    loop {
        while let Ok(signal) = sync_rx.try_recv() {
            match signal {
                SyncSignal::Finished { generation, result } => {
                    model.finish_sync(generation, result);
                }
            }
        }

        terminal.draw(|frame| ui::render(frame, &model))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let app_event = match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => AppEvent::Key(key),
            Event::Paste(text) => AppEvent::Paste(text),
            Event::Resize(width, height) => {
                model = model.with_terminal_size(width, height);
                continue;
            }
            _ => continue,
        };

        let (next, command) = app::update(model, app_event);
        model = next;
        match command {
            AppCommand::None => {}
            AppCommand::Quit => return Ok(()),
            AppCommand::Sync { generation } => spawn_sync(config, generation, sync_tx.clone()),
        }
    }
}

fn spawn_sync(config: &AppConfig, generation: u64, tx: Sender<SyncSignal>) {
    let source = config.build_source();
    tracing::info!(generation, source = %source.describe(), "sync started");
    std::thread::spawn(move || {
        let result = run_sync(source.as_ref()).map_err(|error| {
            tracing::error!(%error, "sync failed");
            error.to_string()
        });
        let _ = tx.send(SyncSignal::Finished { generation, result });
    });
}
