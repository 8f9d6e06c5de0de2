//! Settings editor (`--settings` and the `settings` menu command).
//!
//! Password-gated. Every edit is saved immediately and followed by a
//! reconciliation pass, so a schedule change takes effect without waiting
//! for the next half-hour boundary.

use crate::config::{self, Settings};
use crate::console::{self, Input};
use crate::controller::{Controller, Trigger};
use crate::hosts_manager;
use crate::password::CredentialStore;
use crate::platform::AppPaths;
use crate::schedule::{parse_day, Mode, SlotState, WeeklySchedule, DAYS, HOURS_PER_DAY};
use crate::AppError;
use chrono::{Local, Weekday};
use std::ops::Range;

const EDITOR_HELP: &str = "\
Settings commands:
  show                          print mode, schedule and site list
  mode [blacklist|whitelist]    switch mode (toggles when no argument)
  enable | disable              turn schedule enforcement on or off
  set <days> <hours> <state>    days: Mon..Sun, all, weekdays, weekend
                                hours: 9 or 9-17 (17 is exclusive)
                                state: empty, full, half
  clear                         empty the grid of the current mode
  site add <domain>             add a domain to the blocked list
  site rm <domain>              remove a domain from the blocked list
  password                      change the password
  done                          close the editor";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Mode(Option<Mode>),
    Enable(bool),
    Set {
        days: Vec<Weekday>,
        hours: Range<u32>,
        state: SlotState,
    },
    Clear,
    SiteAdd(String),
    SiteRemove(String),
    Password,
    Help,
    Done,
}

/// What an applied command touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    None,
    Schedule,
    Sites,
}

fn parse_days(s: &str) -> Result<Vec<Weekday>, String> {
    match s.to_ascii_lowercase().as_str() {
        "all" => Ok(DAYS.to_vec()),
        "weekdays" => Ok(DAYS[..5].to_vec()),
        "weekend" => Ok(DAYS[5..].to_vec()),
        _ => parse_day(s)
            .map(|d| vec![d])
            .ok_or_else(|| format!("unknown day '{s}'")),
    }
}

fn parse_hours(s: &str) -> Result<Range<u32>, String> {
    let parse = |h: &str| {
        h.trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid hour '{h}'"))
    };
    let range = match s.split_once('-') {
        Some((start, end)) => parse(start)?..parse(end)?,
        None => {
            let h = parse(s)?;
            h..h + 1
        }
    };
    if range.start >= range.end || range.end > HOURS_PER_DAY {
        return Err(format!("hour range '{s}' must lie within 0-24"));
    }
    Ok(range)
}

/// Accepts bare domains as well as pasted URLs.
pub fn normalize_domain(input: &str) -> Result<String, String> {
    let lower = input.trim().to_ascii_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(lower.as_str());
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('.');

    let valid = host.contains('.')
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if !valid {
        return Err(format!("'{input}' is not a domain name"));
    }
    Ok(host.to_string())
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["show"] => Ok(Command::Show),
        ["mode"] => Ok(Command::Mode(None)),
        ["mode", m] => m.parse().map(|m| Command::Mode(Some(m))),
        ["enable"] => Ok(Command::Enable(true)),
        ["disable"] => Ok(Command::Enable(false)),
        ["set", days, hours, state] => Ok(Command::Set {
            days: parse_days(days)?,
            hours: parse_hours(hours)?,
            state: state.parse()?,
        }),
        ["clear"] => Ok(Command::Clear),
        ["site", "add", domain] => normalize_domain(domain).map(Command::SiteAdd),
        ["site", "rm" | "remove", domain] => normalize_domain(domain).map(Command::SiteRemove),
        ["password"] => Ok(Command::Password),
        ["help" | "?"] => Ok(Command::Help),
        ["done" | "quit" | "exit"] => Ok(Command::Done),
        _ => Err(format!("unrecognised command '{}'", line.trim())),
    }
}

/// Apply an edit command to `settings` in memory.
pub fn apply(settings: &mut Settings, command: &Command) -> Change {
    let schedule = &mut settings.schedule;
    match command {
        Command::Mode(mode) => {
            let next = match mode {
                Some(mode) => *mode,
                None => schedule.mode.toggled(),
            };
            schedule.mode = next;
            Change::Schedule
        }
        Command::Enable(enabled) => {
            schedule.enabled = *enabled;
            Change::Schedule
        }
        Command::Set { days, hours, state } => {
            let grid = schedule.grid_mut(schedule.mode);
            for &day in days {
                for hour in hours.clone() {
                    grid.set(day, hour, *state);
                }
            }
            Change::Schedule
        }
        Command::Clear => {
            schedule.grid_mut(schedule.mode).clear();
            Change::Schedule
        }
        Command::SiteAdd(domain) => {
            if settings.blocked_sites.contains(domain) {
                return Change::None;
            }
            settings.blocked_sites.push(domain.clone());
            Change::Sites
        }
        Command::SiteRemove(domain) => {
            let before = settings.blocked_sites.len();
            settings.blocked_sites.retain(|d| d != domain);
            if settings.blocked_sites.len() == before {
                Change::None
            } else {
                Change::Sites
            }
        }
        Command::Show | Command::Password | Command::Help | Command::Done => Change::None,
    }
}

/// One row per day, one column per hour: `#` full, `/` half, `.` empty.
pub fn render_grid(grid: &WeeklySchedule) -> String {
    let mut out = String::from("     ");
    for hour in 0..HOURS_PER_DAY {
        out.push(char::from_digit(hour / 10, 10).unwrap_or(' '));
    }
    out.push_str("\n     ");
    for hour in 0..HOURS_PER_DAY {
        out.push(char::from_digit(hour % 10, 10).unwrap_or(' '));
    }
    for day in DAYS {
        out.push_str(&format!("\n{day}  "));
        for hour in 0..HOURS_PER_DAY {
            out.push(match grid.get(day, hour) {
                SlotState::Empty => '.',
                SlotState::Full => '#',
                SlotState::Half => '/',
            });
        }
    }
    out
}

pub fn summary(settings: &Settings) -> String {
    let schedule = &settings.schedule;
    let sites = if settings.blocked_sites.is_empty() {
        "(none)".to_string()
    } else {
        settings.blocked_sites.join(", ")
    };
    let grid = schedule.active_grid();
    let slots = if grid.is_empty() {
        "no slots set".to_string()
    } else {
        format!("{} slot(s) set", grid.active_slots())
    };
    format!(
        "Mode: {}  Schedule: {} ({slots})\n{}\nBlocked sites: {sites}",
        schedule.mode,
        if schedule.enabled { "enabled" } else { "disabled" },
        render_grid(grid),
    )
}

/// Interactive editor loop.
pub fn run_editor(
    paths: &AppPaths,
    controller: &Controller,
    input: &dyn Input,
) -> Result<(), AppError> {
    let store = CredentialStore::new(&paths.credentials);
    if !store.has_password()? {
        println!("No password is set. Run with --setup or --reset-password first.");
        return Ok(());
    }
    let Some(candidate) = input.secret("Enter your password: ") else {
        return Ok(());
    };
    controller.auth().check_password(&candidate)?;

    let mut settings = config::load(&paths.settings);
    println!("{}\n\n{EDITOR_HELP}", summary(&settings));

    while let Some(line) = input.line("settings> ") {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(msg) => {
                println!("{msg}");
                continue;
            }
        };

        match command {
            Command::Done => break,
            Command::Show => println!("{}", summary(&settings)),
            Command::Help => println!("{EDITOR_HELP}"),
            Command::Password => change_password(&store, controller, input)?,
            ref edit => {
                let change = apply(&mut settings, edit);
                if let Err(e) = commit(paths, controller, &settings, change) {
                    log::warn!("Saving settings failed: {e}");
                    println!("{}", console::user_message(&e));
                }
            }
        }
    }

    Ok(())
}

/// Save, refresh the blocked reference if the site list moved, and reconcile.
fn commit(
    paths: &AppPaths,
    controller: &Controller,
    settings: &Settings,
    change: Change,
) -> Result<(), AppError> {
    if change == Change::None {
        return Ok(());
    }
    config::save(&paths.settings, settings)?;
    log::info!("Settings saved");

    if change == Change::Sites {
        // Read before re-rendering: afterwards the old block no longer matches.
        let was_blocked = controller.is_blocked().unwrap_or(false);
        hosts_manager::ensure_clean_reference(paths)?;
        hosts_manager::render_blocked_reference(paths, &settings.blocked_sites)?;
        if was_blocked {
            controller.restrict()?;
        }
    }

    let outcome = controller.reconcile(Trigger::SettingsChanged, Local::now().naive_local())?;
    println!("{}", console::describe(outcome));
    Ok(())
}

fn change_password(
    store: &CredentialStore,
    controller: &Controller,
    input: &dyn Input,
) -> Result<(), AppError> {
    let Some(current) = input.secret("Current password: ") else {
        return Ok(());
    };
    if let Err(e) = controller.auth().check_password(&current) {
        log::warn!("Password change rejected: {e}");
        println!("{}", console::user_message(&e));
        return Ok(());
    }
    match console::confirmed_secret(input, "New password: ")? {
        Some(new) => {
            store.set_password(&new)?;
            log::info!("Password updated");
            println!("Password updated.");
        }
        None => println!("Password unchanged."),
    }
    Ok(())
}
