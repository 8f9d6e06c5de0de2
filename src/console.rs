//! Terminal input and the console menu of the long-lived process.
//!
//! The menu stands in for the tray: toggle, check schedule, settings,
//! reset password, quit. Stdin lines and the watchdog's password-needing
//! ticks arrive on one channel and are handled in order on a single thread,
//! so two password prompts never race for the terminal.

use crate::controller::{Controller, Outcome, Trigger};
use crate::platform::AppPaths;
use crate::{recovery, settings, AppError};
use chrono::Local;
use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::thread;

/// Source of user input.
pub trait Input: Send + Sync {
    /// Show `label` and read one trimmed line. `None` when input is closed
    /// or the user entered nothing.
    fn line(&self, label: &str) -> Option<String>;

    /// Like [`Input::line`], for passwords and recovery answers.
    fn secret(&self, label: &str) -> Option<String> {
        self.line(label)
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Reads straight from stdin.
pub struct Terminal;

impl Input for Terminal {
    fn line(&self, label: &str) -> Option<String> {
        print!("{label}");
        io::stdout().flush().ok()?;
        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => None,
            Ok(_) => non_empty(&input),
        }
    }

    fn secret(&self, label: &str) -> Option<String> {
        // Unattended runs (cron, systemd timers) must not hang on a prompt.
        if !io::stdin().is_terminal() {
            log::warn!("No terminal attached; cannot ask for a password");
            return None;
        }
        match rpassword::prompt_password(label) {
            Ok(input) => non_empty(&input),
            Err(e) => {
                log::warn!("Cannot read password: {e}");
                None
            }
        }
    }
}

/// Prompt until the two entries match. `None` if cancelled.
pub fn confirmed_secret(input: &dyn Input, label: &str) -> Result<Option<String>, AppError> {
    let Some(first) = input.secret(label) else {
        return Ok(None);
    };
    let Some(second) = input.secret("Confirm:  ") else {
        return Ok(None);
    };
    if first != second {
        return Err(AppError::Password("Passwords do not match".into()));
    }
    Ok(Some(first))
}

// =========================================================================
// Event inbox
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Line(String),
    /// A pass that may need to ask for the password.
    Tick(Trigger),
    Eof,
}

/// Single queue shared by the stdin reader and the watchdog.
pub struct Inbox {
    rx: Mutex<Receiver<Event>>,
    deferred: Mutex<VecDeque<Event>>,
    closed: Mutex<bool>,
}

impl Inbox {
    pub fn new() -> (Sender<Event>, Self) {
        let (tx, rx) = mpsc::channel();
        let inbox = Self {
            rx: Mutex::new(rx),
            deferred: Mutex::new(VecDeque::new()),
            closed: Mutex::new(false),
        };
        (tx, inbox)
    }

    /// Forward stdin lines into the inbox on a background thread.
    pub fn spawn_stdin_reader(tx: Sender<Event>) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(Event::Line(line)).is_err() {
                    return;
                }
            }
            let _ = tx.send(Event::Eof);
        })
    }

    /// Next event, deferred ones first. `None` once every sender is gone.
    pub fn next(&self) -> Option<Event> {
        if let Some(event) = lock(&self.deferred).pop_front() {
            return Some(event);
        }
        let event = lock(&self.rx).recv().ok()?;
        if event == Event::Eof {
            *lock(&self.closed) = true;
        }
        Some(event)
    }

    fn is_closed(&self) -> bool {
        *lock(&self.closed)
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// Lines come from the shared reader thread, so secrets are read unmasked.
impl Input for Inbox {
    fn line(&self, label: &str) -> Option<String> {
        if self.is_closed() {
            return None;
        }
        print!("{label}");
        let _ = io::stdout().flush();

        let rx = lock(&self.rx);
        loop {
            match rx.recv().ok()? {
                Event::Line(line) => return non_empty(&line),
                Event::Eof => {
                    *lock(&self.closed) = true;
                    return None;
                }
                // Handled once the prompt is answered; one pass per trigger is enough.
                other => {
                    let mut deferred = lock(&self.deferred);
                    if !deferred.contains(&other) {
                        deferred.push_back(other);
                    }
                }
            }
        }
    }
}

// =========================================================================
// Menu
// =========================================================================

const MENU_HELP: &str = "\
Commands:
  toggle           block now, or unblock (password required)
  check            run a schedule check now
  status           show whether blocking is active
  settings         open the settings editor
  reset-password   recover the password with the secret question
  quit             exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    Toggle,
    Check,
    Status,
    Settings,
    ResetPassword,
    Help,
    Quit,
}

pub fn parse_menu_command(line: &str) -> Option<MenuCommand> {
    Some(match line.trim().to_ascii_lowercase().as_str() {
        "t" | "toggle" => MenuCommand::Toggle,
        "c" | "check" => MenuCommand::Check,
        "s" | "status" => MenuCommand::Status,
        "settings" => MenuCommand::Settings,
        "reset-password" | "reset" => MenuCommand::ResetPassword,
        "h" | "help" | "?" => MenuCommand::Help,
        "q" | "quit" | "exit" => MenuCommand::Quit,
        _ => return None,
    })
}

/// Drive the controller from the inbox until `quit` or until every sender is gone.
pub fn run_menu(
    paths: &AppPaths,
    controller: &Controller,
    inbox: &Inbox,
    input: &dyn Input,
) -> Result<(), AppError> {
    println!("{MENU_HELP}");

    while let Some(event) = inbox.next() {
        match event {
            Event::Tick(trigger) => {
                report_pass(controller.reconcile(trigger, Local::now().naive_local()))
            }
            Event::Eof => {
                log::info!("Console closed; enforcement continues on the timer");
            }
            Event::Line(line) if line.trim().is_empty() => {}
            Event::Line(line) => match parse_menu_command(&line) {
                Some(MenuCommand::Quit) => break,
                Some(command) => handle_command(paths, controller, input, command),
                None => println!("Unknown command '{}'. Type 'help'.", line.trim()),
            },
        }
    }

    Ok(())
}

fn handle_command(
    paths: &AppPaths,
    controller: &Controller,
    input: &dyn Input,
    command: MenuCommand,
) {
    let result = match command {
        MenuCommand::Toggle => controller.toggle().map(describe),
        MenuCommand::Check => controller
            .reconcile(Trigger::Manual, Local::now().naive_local())
            .map(describe),
        MenuCommand::Status => controller
            .is_blocked()
            .map(|b| if b { "Focus mode ON" } else { "Focus mode OFF" }.to_string()),
        MenuCommand::Settings => {
            settings::run_editor(paths, controller, input).map(|_| "Settings closed".to_string())
        }
        MenuCommand::ResetPassword => {
            recovery::reset_password(paths, input).map(|_| String::new())
        }
        MenuCommand::Help => Ok(MENU_HELP.to_string()),
        MenuCommand::Quit => Ok(String::new()),
    };

    match result {
        Ok(msg) if msg.is_empty() => {}
        Ok(msg) => println!("{msg}"),
        Err(e) => {
            log::warn!("{command:?} failed: {e}");
            println!("{}", user_message(&e));
        }
    }
}

fn report_pass(result: Result<Outcome, AppError>) {
    match result {
        Ok(outcome) => log::debug!("Scheduled pass: {outcome:?}"),
        Err(e) => log::warn!("Scheduled pass failed: {e}"),
    }
}

pub fn describe(outcome: Outcome) -> String {
    match outcome {
        Outcome::Disabled => "Schedule disabled; nothing to do".into(),
        Outcome::InSync { blocked: true } => "Already blocked".into(),
        Outcome::InSync { blocked: false } => "Already unblocked".into(),
        Outcome::Blocked => "Blocked".into(),
        Outcome::Unblocked => "Unblocked".into(),
        Outcome::NothingToBlock => "No sites to block; add some in settings".into(),
        Outcome::PasswordRequired => "Unblock due; password required".into(),
        Outcome::Refused => "Unblock cancelled; still blocked".into(),
        Outcome::Busy => "Another check is running; try again".into(),
    }
}

/// Text shown to the user for errors surfaced from a command.
pub fn user_message(e: &AppError) -> String {
    match e {
        AppError::AuthFailed => "Access denied: incorrect password.".into(),
        AppError::AuthLockout { remaining_secs } => {
            format!("Too many attempts. Try again in {remaining_secs}s.")
        }
        AppError::PrivilegeDenied(msg) => format!("Permission denied: {msg}"),
        other => format!("Error: {other}"),
    }
}
