//! Transition executor: replaces the live hosts file with a reference copy.
//!
//! The copy itself goes through [`PrivilegedCopy`] because the live file is
//! normally root-owned. Interactive copies may ask the user for elevation;
//! non-interactive copies rely on a pre-installed rule (e.g. a sudoers entry
//! allowing exactly this `cp`) and fail instead of prompting.

use crate::platform::{self, AppPaths};
use crate::AppError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// How privileged copies are performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Elevation {
    /// `sudo cp`, or `sudo -n cp` when non-interactive.
    #[default]
    Sudo,
    /// `pkexec cp` for interactive copies; falls back to `sudo -n cp` otherwise.
    Pkexec,
    /// The process already has write access to the hosts file.
    None,
}

pub trait PrivilegedCopy: Send + Sync {
    fn copy(&self, src: &Path, dst: &Path, interactive: bool) -> Result<(), AppError>;
}

/// Copies by spawning the elevation helper selected in settings.
pub struct CommandCopy {
    elevation: Elevation,
}

impl CommandCopy {
    pub fn new(elevation: Elevation) -> Self {
        Self { elevation }
    }

    fn command(&self, src: &Path, dst: &Path, interactive: bool) -> Option<Command> {
        let mut cmd = match (self.elevation, interactive) {
            (Elevation::None, _) => return None,
            (Elevation::Sudo, true) => Command::new("sudo"),
            (Elevation::Pkexec, true) => Command::new("pkexec"),
            (_, false) => {
                let mut cmd = Command::new("sudo");
                cmd.arg("-n");
                cmd
            }
        };
        cmd.arg("cp").arg(src).arg(dst);
        Some(cmd)
    }
}

impl PrivilegedCopy for CommandCopy {
    fn copy(&self, src: &Path, dst: &Path, interactive: bool) -> Result<(), AppError> {
        let Some(mut cmd) = self.command(src, dst, interactive) else {
            fs::copy(src, dst).map_err(|e| {
                AppError::PrivilegeDenied(format!("Cannot write {}: {e}", dst.display()))
            })?;
            return Ok(());
        };

        let program = cmd.get_program().to_string_lossy().into_owned();
        let status = cmd
            .status()
            .map_err(|e| AppError::PrivilegeDenied(format!("Cannot run {program}: {e}")))?;
        if !status.success() {
            return Err(AppError::PrivilegeDenied(format!(
                "{program} cp {} {} failed ({status})",
                src.display(),
                dst.display()
            )));
        }
        Ok(())
    }
}

/// Applies the blocked or clean reference to the live file.
pub struct Executor {
    copier: Box<dyn PrivilegedCopy>,
    live: PathBuf,
    clean_reference: PathBuf,
    blocked_reference: PathBuf,
}

impl Executor {
    pub fn new(paths: &AppPaths, copier: Box<dyn PrivilegedCopy>) -> Self {
        Self {
            copier,
            live: paths.live_hosts.clone(),
            clean_reference: paths.clean_reference.clone(),
            blocked_reference: paths.blocked_reference.clone(),
        }
    }

    pub fn apply_blocking(&self, interactive: bool) -> Result<(), AppError> {
        self.apply(&self.blocked_reference, interactive)?;
        log::info!("Hosts file replaced with blocked reference");
        Ok(())
    }

    pub fn apply_unblocking(&self, interactive: bool) -> Result<(), AppError> {
        self.apply(&self.clean_reference, interactive)?;
        log::info!("Hosts file replaced with clean reference");
        Ok(())
    }

    fn apply(&self, reference: &Path, interactive: bool) -> Result<(), AppError> {
        // A missing reference would otherwise surface as a generic copy failure.
        if !reference.exists() {
            return Err(AppError::ResourceRead {
                path: reference.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "reference missing"),
            });
        }
        self.copier.copy(reference, &self.live, interactive)?;
        platform::flush_dns();
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Direct copy that records every call.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingCopy {
        pub calls: Arc<AtomicUsize>,
        pub interactive: Arc<Mutex<Vec<bool>>>,
        pub deny: bool,
    }

    impl RecordingCopy {
        pub fn count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PrivilegedCopy for RecordingCopy {
        fn copy(&self, src: &Path, dst: &Path, interactive: bool) -> Result<(), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.interactive.lock().unwrap().push(interactive);
            if self.deny {
                return Err(AppError::PrivilegeDenied("denied".into()));
            }
            fs::copy(src, dst)?;
            Ok(())
        }
    }

    fn setup() -> (tempfile::TempDir, AppPaths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::under(dir.path().join("app"), dir.path().join("hosts"));
        fs::create_dir_all(paths.clean_reference.parent().unwrap()).unwrap();
        fs::write(&paths.clean_reference, "clean\n").unwrap();
        fs::write(&paths.blocked_reference, "blocked\n").unwrap();
        fs::write(&paths.live_hosts, "clean\n").unwrap();
        (dir, paths)
    }

    #[test]
    fn applies_references() {
        let (_dir, paths) = setup();
        let copier = RecordingCopy::default();
        let executor = Executor::new(&paths, Box::new(copier.clone()));

        executor.apply_blocking(false).unwrap();
        assert_eq!(fs::read_to_string(&paths.live_hosts).unwrap(), "blocked\n");

        executor.apply_unblocking(true).unwrap();
        assert_eq!(fs::read_to_string(&paths.live_hosts).unwrap(), "clean\n");

        assert_eq!(copier.count(), 2);
        assert_eq!(*copier.interactive.lock().unwrap(), vec![false, true]);
    }

    #[test]
    fn denial_leaves_live_file_untouched() {
        let (_dir, paths) = setup();
        let copier = RecordingCopy {
            deny: true,
            ..Default::default()
        };
        let executor = Executor::new(&paths, Box::new(copier));

        let err = executor.apply_blocking(false).unwrap_err();
        assert!(matches!(err, AppError::PrivilegeDenied(_)));
        assert_eq!(fs::read_to_string(&paths.live_hosts).unwrap(), "clean\n");
    }

    #[test]
    fn missing_reference_is_reported() {
        let (_dir, paths) = setup();
        fs::remove_file(&paths.blocked_reference).unwrap();
        let copier = RecordingCopy::default();
        let executor = Executor::new(&paths, Box::new(copier.clone()));

        assert!(matches!(
            executor.apply_blocking(false),
            Err(AppError::ResourceRead { .. })
        ));
        assert_eq!(copier.count(), 0);
    }

    #[test]
    fn direct_copy_without_elevation() {
        let (_dir, paths) = setup();
        CommandCopy::new(Elevation::None)
            .copy(&paths.blocked_reference, &paths.live_hosts, false)
            .unwrap();
        assert_eq!(fs::read_to_string(&paths.live_hosts).unwrap(), "blocked\n");
    }

    #[test]
    fn command_selection() {
        let src = Path::new("/a");
        let dst = Path::new("/b");
        let args = |c: &Command| {
            let mut v = vec![c.get_program().to_string_lossy().into_owned()];
            v.extend(c.get_args().map(|a| a.to_string_lossy().into_owned()));
            v
        };

        let sudo = CommandCopy::new(Elevation::Sudo);
        assert_eq!(args(&sudo.command(src, dst, true).unwrap()), ["sudo", "cp", "/a", "/b"]);
        assert_eq!(
            args(&sudo.command(src, dst, false).unwrap()),
            ["sudo", "-n", "cp", "/a", "/b"]
        );

        let pkexec = CommandCopy::new(Elevation::Pkexec);
        assert_eq!(args(&pkexec.command(src, dst, true).unwrap()), ["pkexec", "cp", "/a", "/b"]);
        assert_eq!(args(&pkexec.command(src, dst, false).unwrap())[0..2], ["sudo", "-n"]);

        assert!(CommandCopy::new(Elevation::None).command(src, dst, true).is_none());
    }
}
