//! Focus Mode — schedule-driven website blocking.
//!
//! Swaps the system hosts file between a clean and a blocked reference copy,
//! following a weekly schedule. Blocking never asks for anything; unblocking
//! always requires the password.
//!
//! Usage:
//!   focus-mode                    # Long-running enforcement with a console menu
//!   focus-mode --check            # One reconciliation pass, then exit (cron, timers)
//!   focus-mode --settings         # Settings editor
//!   focus-mode --reset-password   # Password recovery via the secret question
//!   focus-mode --setup            # First-time setup
//!
//! # Privilege
//!
//! Scheduled passes, and toggles from the console menu, copy into the hosts
//! file with `sudo -n cp`, so they need a sudoers rule allowing exactly that
//! copy. `--setup` prints the rule.

mod auth;
mod config;
mod console;
mod controller;
mod executor;
mod hosts_manager;
mod password;
mod platform;
mod recovery;
mod schedule;
mod settings;
mod watchdog;

use auth::AuthGate;
use chrono::Local;
use clap::Parser;
use console::{Event, Inbox, Input, Terminal};
use controller::{Controller, LogObserver, Trigger};
use executor::{CommandCopy, Executor};
use password::CredentialStore;
use platform::AppPaths;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

// =========================================================================
// Error type
// =========================================================================

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot read {}: {source}", .path.display())]
    ResourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Privilege denied: {0}")]
    PrivilegeDenied(String),

    #[error("Incorrect password")]
    AuthFailed,

    #[error("Too many failed attempts; locked for {remaining_secs}s")]
    AuthLockout { remaining_secs: u64 },

    #[error("Password error: {0}")]
    Password(String),
}

// =========================================================================
// CLI
// =========================================================================

#[derive(Parser, Debug)]
#[command(name = "focus-mode", version, about = "Schedule-driven website blocking")]
struct Cli {
    /// Run one reconciliation pass non-interactively and exit
    #[arg(long, conflicts_with_all = ["settings", "reset_password", "setup"])]
    check: bool,

    /// Open the settings editor
    #[arg(long, conflicts_with_all = ["reset_password", "setup"])]
    settings: bool,

    /// Recover the password with the secret question
    #[arg(long, conflicts_with = "setup")]
    reset_password: bool,

    /// Run first-time setup
    #[arg(long)]
    setup: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

// =========================================================================
// Entry point
// =========================================================================

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let paths = AppPaths::discover();

    let result = if cli.check {
        run_check(&paths)
    } else if cli.settings {
        run_settings(&paths)
    } else if cli.reset_password {
        recovery::reset_password(&paths, &Terminal)
    } else if cli.setup {
        recovery::run_setup(&paths, &Terminal)
    } else {
        run_daemon(&paths)
    };

    if let Err(e) = result {
        log::error!("Fatal: {e}");
        eprintln!("{}", console::user_message(&e));
        std::process::exit(1);
    }
}

fn build_controller(paths: &AppPaths, input: Arc<dyn Input>) -> Controller {
    let settings = config::load(&paths.settings);
    let executor = Executor::new(paths, Box::new(CommandCopy::new(settings.elevation)));
    let auth = AuthGate::new(Box::new(CredentialStore::new(&paths.credentials)));
    Controller::new(paths, executor, auth, input, Box::new(LogObserver))
}

// =========================================================================
// --check
// =========================================================================

fn run_check(paths: &AppPaths) -> Result<(), AppError> {
    let controller = build_controller(paths, Arc::new(Terminal));
    let outcome = controller.reconcile(Trigger::Cli, Local::now().naive_local())?;
    log::info!("Check: {outcome:?}");
    println!("{}", console::describe(outcome));
    Ok(())
}

// =========================================================================
// --settings
// =========================================================================

fn run_settings(paths: &AppPaths) -> Result<(), AppError> {
    let controller = build_controller(paths, Arc::new(Terminal));
    settings::run_editor(paths, &controller, &Terminal)
}

// =========================================================================
// Default: long-running enforcement
// =========================================================================

fn run_daemon(paths: &AppPaths) -> Result<(), AppError> {
    if paths.is_first_run() {
        recovery::run_setup(paths, &Terminal)?;
    }
    recovery::prepare_references(paths)?;

    let (tx, inbox) = Inbox::new();
    let inbox = Arc::new(inbox);
    // The stdin reader owns the terminal, so elevation helpers must not prompt.
    let controller = Arc::new(
        build_controller(paths, Arc::clone(&inbox) as Arc<dyn Input>)
            .with_interactive_elevation(false),
    );

    // Handled first by the menu loop, once stdin is being read.
    let _ = tx.send(Event::Tick(Trigger::Startup));

    let _watchdog = watchdog::start(paths.settings.clone(), Arc::clone(&controller), tx.clone());
    let _stdin = Inbox::spawn_stdin_reader(tx);

    console::run_menu(paths, &controller, &inbox, inbox.as_ref())?;
    log::info!("Shutting down");
    Ok(())
}
