//! Background watchdog thread.
//!
//! Wakes every few seconds. At each half-hour boundary (the only moments the
//! desired state can change) and whenever `settings.json` is rewritten it
//! runs a pass on its own thread, so a password prompt open on the console
//! never delays blocking. Unblocks that need the password are handed to the
//! console inbox. Every wake-up also re-reads the oracle so edits to the
//! hosts file made elsewhere are noticed.

use crate::config;
use crate::console::Event;
use crate::controller::{Controller, Outcome, Trigger};
use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

const CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Decides which events are due. Kept free of I/O so it can be driven by tests.
#[derive(Debug, Default)]
pub struct Ticker {
    last_boundary: Option<(NaiveDate, u32, u32)>,
    settings_mtime: Option<Option<SystemTime>>,
}

impl Ticker {
    /// True once per half-hour boundary (minute 0 or 30).
    pub fn boundary_due(&mut self, now: NaiveDateTime) -> bool {
        let minute = now.minute();
        if minute != 0 && minute != 30 {
            return false;
        }
        let slot = (now.date(), now.hour(), minute);
        if self.last_boundary == Some(slot) {
            return false;
        }
        self.last_boundary = Some(slot);
        true
    }

    /// True when the settings file's mtime differs from the previous
    /// observation. The first observation only records a baseline.
    pub fn settings_changed(&mut self, mtime: Option<SystemTime>) -> bool {
        match self.settings_mtime.replace(mtime) {
            None => false,
            Some(previous) => previous != mtime,
        }
    }
}

/// Spawn the watchdog. It exits when the inbox is dropped.
pub fn start(
    settings_path: PathBuf,
    controller: Arc<Controller>,
    tx: Sender<Event>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut ticker = Ticker::default();
        ticker.settings_changed(config::modified(&settings_path));

        loop {
            thread::sleep(CHECK_INTERVAL);

            let now = Local::now().naive_local();
            let mut due = Vec::with_capacity(2);
            if ticker.boundary_due(now) {
                due.push(Trigger::Timer);
            }
            if ticker.settings_changed(config::modified(&settings_path)) {
                log::debug!("[Watchdog] Settings changed on disk");
                due.push(Trigger::SettingsChanged);
            }

            for trigger in due {
                if !run_pass(&controller, trigger, now, &tx) {
                    return;
                }
            }

            if let Err(e) = controller.refresh() {
                log::debug!("[Watchdog] Refresh failed: {e}");
            }
        }
    })
}

/// One unattended pass. Returns false once the inbox is gone.
fn run_pass(
    controller: &Controller,
    trigger: Trigger,
    now: NaiveDateTime,
    tx: &Sender<Event>,
) -> bool {
    match controller.enforce(trigger, now) {
        Ok(Outcome::PasswordRequired) => tx.send(Event::Tick(trigger)).is_ok(),
        Ok(outcome) => {
            log::debug!("[Watchdog] {trigger:?} pass: {outcome:?}");
            true
        }
        Err(e) => {
            log::warn!("[Watchdog] {trigger:?} pass failed: {e}");
            true
        }
    }
}
