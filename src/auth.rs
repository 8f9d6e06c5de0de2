//! Authentication gate with a brute-force throttle.
//!
//! After [`MAX_ATTEMPTS`] consecutive failures every check is rejected for
//! [`LOCKOUT`], correct password or not. Once the cooldown has elapsed the
//! counter resets; a successful check resets it immediately.

use crate::AppError;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const MAX_ATTEMPTS: u32 = 3;
pub const LOCKOUT: Duration = Duration::from_secs(10);

/// Salted-hash comparison against the stored credential.
pub trait Verifier: Send + Sync {
    fn verify(&self, candidate: &str) -> Result<bool, AppError>;
}

/// Failed-attempt bookkeeping. Lives in memory only.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AuthSession {
    failures: u32,
    last_failure: Option<Instant>,
}

impl AuthSession {
    /// Time left in the cooldown, if locked out at `now`.
    pub fn lockout_remaining(&self, now: Instant) -> Option<Duration> {
        if self.failures < MAX_ATTEMPTS {
            return None;
        }
        let since = now.saturating_duration_since(self.last_failure?);
        LOCKOUT.checked_sub(since).filter(|d| !d.is_zero())
    }

    fn record_failure(&mut self, now: Instant) {
        self.failures += 1;
        self.last_failure = Some(now);
    }

    fn reset(&mut self) {
        self.failures = 0;
        self.last_failure = None;
    }
}

pub struct AuthGate {
    verifier: Box<dyn Verifier>,
    session: Mutex<AuthSession>,
}

impl AuthGate {
    pub fn new(verifier: Box<dyn Verifier>) -> Self {
        Self::with_session(verifier, AuthSession::default())
    }

    pub fn with_session(verifier: Box<dyn Verifier>, session: AuthSession) -> Self {
        Self {
            verifier,
            session: Mutex::new(session),
        }
    }

    /// [`AuthGate::authenticate_at`] at the current instant.
    pub fn check_password(&self, candidate: &str) -> Result<(), AppError> {
        self.authenticate_at(candidate, Instant::now())
    }

    pub fn authenticate_at(&self, candidate: &str, now: Instant) -> Result<(), AppError> {
        let mut session = self.lock_session();

        if session.failures >= MAX_ATTEMPTS {
            if let Some(remaining) = session.lockout_remaining(now) {
                log::warn!(
                    "Password check rejected: locked out for {}s",
                    remaining.as_secs()
                );
                return Err(AppError::AuthLockout {
                    remaining_secs: remaining.as_secs().max(1),
                });
            }
            log::debug!("Lockout expired, resetting failed attempts");
            session.reset();
        }

        // A missing or unreadable credential is not a guess; it is not counted.
        if self.verifier.verify(candidate)? {
            session.reset();
            Ok(())
        } else {
            session.record_failure(now);
            log::warn!("Password mismatch ({} consecutive)", session.failures);
            Err(AppError::AuthFailed)
        }
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, AuthSession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}
