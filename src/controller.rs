//! Reconciliation controller.
//!
//! A pass reads the settings, resolves the desired state, reads the actual
//! state from the oracle and applies a transition only when they disagree.
//! Restricting never needs a password; lifting a restriction always does.
//!
//! Passes are serialized twice over: an in-process guard and an exclusive
//! lock file shared with any other invocation (e.g. `--check` from cron).

use crate::auth::AuthGate;
use crate::config;
use crate::console::Input;
use crate::executor::Executor;
use crate::hosts_manager::Oracle;
use crate::platform::AppPaths;
use crate::schedule::{self, Action};
use crate::AppError;
use chrono::NaiveDateTime;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::Instant;

/// What asked for the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    Timer,
    SettingsChanged,
    Cli,
    Manual,
}

impl Trigger {
    /// Timer-driven passes skip instead of waiting when another pass is running.
    fn may_skip(self) -> bool {
        matches!(self, Self::Timer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Schedule disabled; nothing to enforce.
    Disabled,
    /// Actual state already matches the desired state.
    InSync { blocked: bool },
    Blocked,
    Unblocked,
    /// Blocking is due but the site list is empty.
    NothingToBlock,
    /// Unblock due; only an attended pass may ask for the password.
    PasswordRequired,
    /// Unblock needed but no password was given.
    Refused,
    /// Another pass held the lock.
    Busy,
}

/// Tray refresh hook.
pub trait StateObserver: Send + Sync {
    fn state_changed(&self, blocked: bool);
}

/// Reports state changes in the log, standing in for a tray icon and tooltip.
pub struct LogObserver;

impl StateObserver for LogObserver {
    fn state_changed(&self, blocked: bool) {
        if blocked {
            log::info!("Focus mode ON");
        } else {
            log::info!("Focus mode OFF");
        }
    }
}

pub struct Controller {
    settings_path: PathBuf,
    lock_path: PathBuf,
    oracle: Oracle,
    executor: Executor,
    auth: AuthGate,
    input: Arc<dyn Input>,
    observer: Box<dyn StateObserver>,
    interactive_elevation: bool,
    pass_guard: Mutex<()>,
    last_seen: Mutex<Option<bool>>,
}

/// Both guards; released on drop.
struct PassLock<'a> {
    _guard: MutexGuard<'a, ()>,
    file: File,
}

impl Drop for PassLock<'_> {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl Controller {
    pub fn new(
        paths: &AppPaths,
        executor: Executor,
        auth: AuthGate,
        input: Arc<dyn Input>,
        observer: Box<dyn StateObserver>,
    ) -> Self {
        Self {
            settings_path: paths.settings.clone(),
            lock_path: paths.lock.clone(),
            oracle: Oracle::new(paths),
            executor,
            auth,
            input,
            observer,
            interactive_elevation: true,
            pass_guard: Mutex::new(()),
            last_seen: Mutex::new(None),
        }
    }

    /// Whether manual toggles may let the elevation helper prompt. Must be
    /// off while another thread is reading the same terminal.
    pub fn with_interactive_elevation(mut self, allowed: bool) -> Self {
        self.interactive_elevation = allowed;
        self
    }

    pub fn auth(&self) -> &AuthGate {
        &self.auth
    }

    pub fn is_blocked(&self) -> Result<bool, AppError> {
        self.oracle.is_blocked()
    }

    /// One reconciliation pass against the schedule at `now`.
    ///
    /// The pass lock is not held while the password is asked for; once it
    /// is given the decision is taken again against fresh state.
    pub fn reconcile(&self, trigger: Trigger, now: NaiveDateTime) -> Result<Outcome, AppError> {
        let asked_at = Instant::now();
        let outcome = self.pass(trigger, now, false)?;
        if outcome != Outcome::PasswordRequired {
            return Ok(outcome);
        }

        if !self.authorize("Enter your password to unblock: ")? {
            return Ok(Outcome::Refused);
        }
        let waited = chrono::Duration::from_std(asked_at.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.pass(trigger, now + waited, true)
    }

    /// A pass that never prompts. A due unblock is reported as
    /// [`Outcome::PasswordRequired`] and left for an attended pass.
    pub fn enforce(&self, trigger: Trigger, now: NaiveDateTime) -> Result<Outcome, AppError> {
        self.pass(trigger, now, false)
    }

    fn pass(
        &self,
        trigger: Trigger,
        now: NaiveDateTime,
        authorized: bool,
    ) -> Result<Outcome, AppError> {
        // An answered prompt is not thrown away because a timer pass is running.
        let Some(_lock) = self.acquire(trigger.may_skip() && !authorized)? else {
            log::debug!("Reconcile ({trigger:?}) skipped: another pass is running");
            return Ok(Outcome::Busy);
        };

        let settings = config::load(&self.settings_path);
        let action = schedule::resolve(&settings.schedule, &now);
        let blocked = self.read_state()?;
        log::debug!("Reconcile ({trigger:?}) at {now}: desired {action}, blocked {blocked}");

        let outcome = match (action, blocked) {
            (Action::NoOp, _) => Outcome::Disabled,
            (Action::Block, false) => {
                if !self.oracle.has_restrictions()? {
                    log::debug!("Schedule requires blocking, but the site list is empty");
                    return Ok(Outcome::NothingToBlock);
                }
                log::info!("Schedule requires blocking");
                self.executor.apply_blocking(false)?;
                self.confirm(Outcome::Blocked)?
            }
            (Action::Unblock, true) if !authorized => {
                log::info!("Schedule allows unblocking; password required");
                Outcome::PasswordRequired
            }
            (Action::Unblock, true) => {
                self.executor.apply_unblocking(false)?;
                self.confirm(Outcome::Unblocked)?
            }
            _ => Outcome::InSync { blocked },
        };

        Ok(outcome)
    }

    /// Manual toggle outside the schedule.
    pub fn toggle(&self) -> Result<Outcome, AppError> {
        let Some(lock) = self.acquire(false)? else {
            return Ok(Outcome::Busy);
        };

        if !self.read_state()? {
            if !self.oracle.has_restrictions()? {
                return Ok(Outcome::NothingToBlock);
            }
            self.executor.apply_blocking(self.interactive_elevation)?;
            return self.confirm(Outcome::Blocked);
        }

        drop(lock);
        if !self.authorize("Enter your password: ")? {
            log::info!("Unblock cancelled");
            return Ok(Outcome::Refused);
        }

        let Some(_lock) = self.acquire(false)? else {
            return Ok(Outcome::Busy);
        };
        if !self.read_state()? {
            return Ok(Outcome::InSync { blocked: false });
        }
        self.executor.apply_unblocking(self.interactive_elevation)?;
        self.confirm(Outcome::Unblocked)
    }

    /// Apply the blocked reference unless it is already in force.
    pub fn restrict(&self) -> Result<Outcome, AppError> {
        let Some(_lock) = self.acquire(false)? else {
            return Ok(Outcome::Busy);
        };
        if self.read_state()? {
            return Ok(Outcome::InSync { blocked: true });
        }
        if self.oracle.live_matches_blocked()? {
            return Ok(Outcome::NothingToBlock);
        }
        // With an empty list the blocked reference is the clean one; copying
        // it still drops entries for sites that were just removed.
        self.executor.apply_blocking(false)?;
        if !self.oracle.has_restrictions()? {
            return Ok(Outcome::NothingToBlock);
        }
        self.confirm(Outcome::Blocked)
    }

    /// Read the oracle and notify the observer if the state moved since the
    /// last read, including edits made by other software.
    pub fn refresh(&self) -> Result<bool, AppError> {
        self.read_state()
    }

    fn read_state(&self) -> Result<bool, AppError> {
        let blocked = self.oracle.is_blocked().map_err(|e| {
            log::error!("Cannot determine block state: {e}");
            e
        })?;

        let mut last = self.last_seen.lock().unwrap_or_else(|e| e.into_inner());
        if *last != Some(blocked) {
            *last = Some(blocked);
            self.observer.state_changed(blocked);
        }
        Ok(blocked)
    }

    fn confirm(&self, expected: Outcome) -> Result<Outcome, AppError> {
        let blocked = self.read_state()?;
        let reached = match expected {
            Outcome::Blocked => blocked,
            Outcome::Unblocked => !blocked,
            _ => true,
        };
        if !reached {
            log::warn!("Transition to {expected:?} did not take effect (blocked: {blocked})");
            return Ok(Outcome::InSync { blocked });
        }
        Ok(expected)
    }

    /// Ask for the password without holding the pass lock. `Ok(false)` when
    /// none was given.
    fn authorize(&self, label: &str) -> Result<bool, AppError> {
        let Some(candidate) = self.input.secret(label) else {
            log::warn!("Unblock refused: no password provided");
            return Ok(false);
        };
        self.auth.check_password(&candidate)?;
        Ok(true)
    }

    fn acquire(&self, skip_if_busy: bool) -> Result<Option<PassLock<'_>>, AppError> {
        let guard = match self.pass_guard.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
            Err(TryLockError::WouldBlock) if skip_if_busy => return Ok(None),
            Err(TryLockError::WouldBlock) => {
                self.pass_guard.lock().unwrap_or_else(|e| e.into_inner())
            }
        };

        if let Some(dir) = self.lock_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;

        if skip_if_busy {
            if file.try_lock_exclusive().is_err() {
                return Ok(None);
            }
        } else {
            file.lock_exclusive()?;
        }

        Ok(Some(PassLock {
            _guard: guard,
            file,
        }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::tests::FixedPassword;
    use crate::console::tests::Scripted;
    use crate::executor::tests::RecordingCopy;
    use crate::hosts_manager;
    use crate::schedule::{Mode, SlotState};
    use chrono::{NaiveDate, Weekday};
    use std::sync::mpsc;
    use std::thread;

    const CLEAN: &str = "127.0.0.1 localhost\n";

    pub(crate) struct Fixture {
        _dir: tempfile::TempDir,
        pub paths: AppPaths,
        pub copier: RecordingCopy,
        changes: Arc<Mutex<Vec<bool>>>,
    }

    struct Recorder(Arc<Mutex<Vec<bool>>>);

    impl StateObserver for Recorder {
        fn state_changed(&self, blocked: bool) {
            self.0.lock().unwrap().push(blocked);
        }
    }

    pub(crate) fn fixture(schedule: &str) -> Fixture {
        fixture_with_sites(schedule, &["distracting.example".into()])
    }

    fn fixture_with_sites(schedule: &str, sites: &[String]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::under(dir.path().join("app"), dir.path().join("hosts"));
        fs::write(&paths.live_hosts, CLEAN).unwrap();
        hosts_manager::ensure_clean_reference(&paths).unwrap();
        hosts_manager::render_blocked_reference(&paths, sites).unwrap();
        fs::write(&paths.settings, schedule).unwrap();
        Fixture {
            _dir: dir,
            paths,
            copier: RecordingCopy::default(),
            changes: Arc::default(),
        }
    }

    impl Fixture {
        pub fn controller(&self, answers: &[&str]) -> Controller {
            self.controller_with(Arc::new(Scripted::new(answers)))
        }

        fn controller_with(&self, input: Arc<dyn Input>) -> Controller {
            Controller::new(
                &self.paths,
                Executor::new(&self.paths, Box::new(self.copier.clone())),
                AuthGate::new(Box::new(FixedPassword("secret"))),
                input,
                Box::new(Recorder(Arc::clone(&self.changes))),
            )
        }

        fn live(&self) -> String {
            fs::read_to_string(&self.paths.live_hosts).unwrap()
        }

        pub fn block_live(&self) {
            fs::copy(&self.paths.blocked_reference, &self.paths.live_hosts).unwrap();
        }
    }

    /// Announces each prompt, then waits for the test to supply the answer.
    struct HeldPrompt {
        prompted: Mutex<mpsc::Sender<()>>,
        answers: Mutex<mpsc::Receiver<String>>,
    }

    impl HeldPrompt {
        fn new() -> (Self, mpsc::Receiver<()>, mpsc::Sender<String>) {
            let (prompted_tx, prompted_rx) = mpsc::channel();
            let (answer_tx, answer_rx) = mpsc::channel();
            let input = Self {
                prompted: Mutex::new(prompted_tx),
                answers: Mutex::new(answer_rx),
            };
            (input, prompted_rx, answer_tx)
        }
    }

    impl Input for HeldPrompt {
        fn line(&self, _label: &str) -> Option<String> {
            self.prompted.lock().unwrap().send(()).unwrap();
            self.answers.lock().unwrap().recv().ok()
        }
    }

    pub(crate) fn monday(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    pub(crate) const MON_9_BLACKLIST: &str =
        r#"{"mode": "blacklist", "schedule_enabled": true, "schedule_data": {"Mon,9": 1}}"#;

    #[test]
    fn schedule_blocks_without_password() {
        let fx = fixture(MON_9_BLACKLIST);
        let ctl = fx.controller(&[]);

        assert!(!ctl.is_blocked().unwrap());
        assert_eq!(ctl.reconcile(Trigger::Cli, monday(9, 15)).unwrap(), Outcome::Blocked);
        assert!(ctl.is_blocked().unwrap());
        assert_eq!(fx.copier.count(), 1);
        assert_eq!(*fx.copier.interactive.lock().unwrap(), vec![false]);
        assert!(fx.live().contains("distracting.example"));
        assert_eq!(*fx.changes.lock().unwrap(), vec![false, true]);
    }

    #[test]
    fn matching_state_makes_no_copies() {
        let fx = fixture(MON_9_BLACKLIST);
        let ctl = fx.controller(&[]);

        assert_eq!(
            ctl.reconcile(Trigger::Timer, monday(11, 0)).unwrap(),
            Outcome::InSync { blocked: false }
        );
        fx.block_live();
        assert_eq!(
            ctl.reconcile(Trigger::Timer, monday(9, 30)).unwrap(),
            Outcome::InSync { blocked: true }
        );
        assert_eq!(fx.copier.count(), 0);
    }

    #[test]
    fn disabled_schedule_never_transitions() {
        let fx = fixture(r#"{"mode": "blacklist", "schedule_enabled": false, "schedule_data": {"Mon,9": 1}}"#);
        let ctl = fx.controller(&[]);
        assert_eq!(ctl.reconcile(Trigger::Timer, monday(9, 0)).unwrap(), Outcome::Disabled);
        assert_eq!(fx.copier.count(), 0);
    }

    #[test]
    fn scheduled_unblock_needs_password() {
        let fx = fixture(MON_9_BLACKLIST);
        fx.block_live();

        let ctl = fx.controller(&[]);
        assert_eq!(ctl.reconcile(Trigger::Timer, monday(10, 0)).unwrap(), Outcome::Refused);
        assert!(ctl.is_blocked().unwrap());

        let ctl = fx.controller(&["wrong"]);
        assert!(matches!(
            ctl.reconcile(Trigger::Timer, monday(10, 0)),
            Err(AppError::AuthFailed)
        ));
        assert!(ctl.is_blocked().unwrap());
        assert_eq!(fx.copier.count(), 0);

        let ctl = fx.controller(&["secret"]);
        assert_eq!(ctl.reconcile(Trigger::Timer, monday(10, 0)).unwrap(), Outcome::Unblocked);
        assert_eq!(fx.live(), CLEAN);
    }

    #[test]
    fn whitelist_blocks_outside_allowed_hours() {
        let fx = fixture(
            r#"{"mode": "whitelist", "schedule_enabled": true, "schedule_data": {"whitelist": {"Mon,12": 1}}}"#,
        );
        let ctl = fx.controller(&["secret"]);

        assert_eq!(ctl.reconcile(Trigger::Timer, monday(12, 10)).unwrap(), Outcome::InSync { blocked: false });
        assert_eq!(ctl.reconcile(Trigger::Timer, monday(13, 0)).unwrap(), Outcome::Blocked);
    }

    #[test]
    fn external_edit_is_detected() {
        let fx = fixture(MON_9_BLACKLIST);
        let ctl = fx.controller(&[]);
        ctl.reconcile(Trigger::Cli, monday(9, 0)).unwrap();
        assert!(ctl.refresh().unwrap());

        fs::copy(&fx.paths.clean_reference, &fx.paths.live_hosts).unwrap();
        assert!(!ctl.refresh().unwrap());
        assert_eq!(*fx.changes.lock().unwrap(), vec![false, true, false]);

        // The next pass restores the restriction.
        assert_eq!(ctl.reconcile(Trigger::Timer, monday(9, 30)).unwrap(), Outcome::Blocked);
    }

    #[test]
    fn read_failure_aborts_the_pass() {
        let fx = fixture(MON_9_BLACKLIST);
        fs::remove_file(&fx.paths.live_hosts).unwrap();
        let ctl = fx.controller(&[]);

        assert!(matches!(
            ctl.reconcile(Trigger::Timer, monday(9, 0)),
            Err(AppError::ResourceRead { .. })
        ));
        assert_eq!(fx.copier.count(), 0);

        // Next tick starts from scratch.
        fs::write(&fx.paths.live_hosts, CLEAN).unwrap();
        assert_eq!(ctl.reconcile(Trigger::Timer, monday(9, 0)).unwrap(), Outcome::Blocked);
    }

    #[test]
    fn toggle_is_asymmetric() {
        let fx = fixture(r#"{}"#);
        let ctl = fx.controller(&["secret"]);

        assert_eq!(ctl.toggle().unwrap(), Outcome::Blocked);
        assert_eq!(ctl.toggle().unwrap(), Outcome::Unblocked);
        assert_eq!(*fx.copier.interactive.lock().unwrap(), vec![true, true]);

        // No more scripted answers: the next unblock is refused.
        assert_eq!(ctl.toggle().unwrap(), Outcome::Blocked);
        assert_eq!(ctl.toggle().unwrap(), Outcome::Refused);
        assert!(ctl.is_blocked().unwrap());
    }

    #[test]
    fn toggle_respects_lockout() {
        let fx = fixture(r#"{}"#);
        fx.block_live();
        let ctl = fx.controller(&["a", "b", "c", "secret"]);

        for _ in 0..3 {
            assert!(matches!(ctl.toggle(), Err(AppError::AuthFailed)));
        }
        assert!(matches!(ctl.toggle(), Err(AppError::AuthLockout { .. })));
        assert!(ctl.is_blocked().unwrap());
        assert_eq!(fx.copier.count(), 0);
    }

    #[test]
    fn timer_pass_skips_while_another_holds_the_lock() {
        let fx = fixture(MON_9_BLACKLIST);
        let ctl = fx.controller(&[]);

        let other = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&fx.paths.lock)
            .unwrap();
        other.lock_exclusive().unwrap();

        assert_eq!(ctl.reconcile(Trigger::Timer, monday(9, 0)).unwrap(), Outcome::Busy);
        assert_eq!(fx.copier.count(), 0);

        FileExt::unlock(&other).unwrap();
        assert_eq!(ctl.reconcile(Trigger::Timer, monday(9, 0)).unwrap(), Outcome::Blocked);
    }

    #[test]
    fn restrict_needs_no_password() {
        let fx = fixture(r#"{}"#);
        let ctl = fx.controller(&[]);
        assert_eq!(ctl.restrict().unwrap(), Outcome::Blocked);
        assert_eq!(ctl.restrict().unwrap(), Outcome::InSync { blocked: true });
        assert_eq!(fx.copier.count(), 1);
    }

    #[test]
    fn grid_is_read_fresh_each_pass() {
        let fx = fixture(MON_9_BLACKLIST);
        let ctl = fx.controller(&[]);
        assert_eq!(
            ctl.reconcile(Trigger::Timer, monday(14, 0)).unwrap(),
            Outcome::InSync { blocked: false }
        );

        let mut settings = config::load(&fx.paths.settings);
        settings.schedule.grid_mut(Mode::Blacklist).set(Weekday::Mon, 14, SlotState::Half);
        config::save(&fx.paths.settings, &settings).unwrap();

        assert_eq!(
            ctl.reconcile(Trigger::SettingsChanged, monday(14, 0)).unwrap(),
            Outcome::Blocked
        );
    }
    #[test]
    fn prompt_does_not_hold_the_pass_lock() {
        let fx = fixture(MON_9_BLACKLIST);
        fx.block_live();
        let (input, prompted, answer) = HeldPrompt::new();
        let attended = fx.controller_with(Arc::new(input));
        let other = fx.controller(&[]);

        thread::scope(|s| {
            let waiting = s.spawn(|| attended.reconcile(Trigger::Timer, monday(10, 0)));
            prompted.recv().unwrap();

            // A second invocation completes while the first prompt is open.
            assert_eq!(
                other.reconcile(Trigger::Cli, monday(9, 15)).unwrap(),
                Outcome::InSync { blocked: true }
            );
            assert_eq!(
                other.enforce(Trigger::Timer, monday(10, 0)).unwrap(),
                Outcome::PasswordRequired
            );

            answer.send("secret".into()).unwrap();
            assert_eq!(waiting.join().unwrap().unwrap(), Outcome::Unblocked);
        });
        assert_eq!(fx.live(), CLEAN);
    }

    #[test]
    fn answered_prompt_rechecks_the_schedule() {
        let fx = fixture(MON_9_BLACKLIST);
        fx.block_live();
        let (input, prompted, answer) = HeldPrompt::new();
        let ctl = fx.controller_with(Arc::new(input));

        thread::scope(|s| {
            let waiting = s.spawn(|| ctl.reconcile(Trigger::Timer, monday(10, 0)));
            prompted.recv().unwrap();

            let mut settings = config::load(&fx.paths.settings);
            settings.schedule.grid_mut(Mode::Blacklist).set(Weekday::Mon, 10, SlotState::Full);
            config::save(&fx.paths.settings, &settings).unwrap();

            answer.send("secret".into()).unwrap();
            assert_eq!(
                waiting.join().unwrap().unwrap(),
                Outcome::InSync { blocked: true }
            );
        });
        assert_eq!(fx.copier.count(), 0);
    }

    #[test]
    fn enforce_blocks_but_never_prompts() {
        let fx = fixture(MON_9_BLACKLIST);
        let ctl = fx.controller(&["secret"]);

        assert_eq!(ctl.enforce(Trigger::Timer, monday(9, 0)).unwrap(), Outcome::Blocked);
        assert_eq!(
            ctl.enforce(Trigger::Timer, monday(10, 0)).unwrap(),
            Outcome::PasswordRequired
        );
        assert!(ctl.is_blocked().unwrap());

        // The scripted password is still there for the attended pass.
        assert_eq!(ctl.reconcile(Trigger::Timer, monday(10, 0)).unwrap(), Outcome::Unblocked);
    }

    #[test]
    fn empty_site_list_never_blocks_or_prompts() {
        let fx = fixture_with_sites(MON_9_BLACKLIST, &[]);
        let ctl = fx.controller(&[]);

        assert!(!ctl.is_blocked().unwrap());
        assert_eq!(
            ctl.reconcile(Trigger::Timer, monday(10, 0)).unwrap(),
            Outcome::InSync { blocked: false }
        );
        assert_eq!(
            ctl.reconcile(Trigger::Timer, monday(9, 0)).unwrap(),
            Outcome::NothingToBlock
        );
        assert_eq!(ctl.toggle().unwrap(), Outcome::NothingToBlock);
        assert_eq!(ctl.restrict().unwrap(), Outcome::NothingToBlock);
        assert_eq!(fx.copier.count(), 0);
    }

    #[test]
    fn toggle_can_forbid_elevation_prompts() {
        let fx = fixture(r#"{}"#);
        let ctl = fx.controller(&["secret"]).with_interactive_elevation(false);

        assert_eq!(ctl.toggle().unwrap(), Outcome::Blocked);
        assert_eq!(ctl.toggle().unwrap(), Outcome::Unblocked);
        assert_eq!(*fx.copier.interactive.lock().unwrap(), vec![false, false]);
    }
}
