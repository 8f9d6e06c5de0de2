//! OS-specific paths and utilities.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Override for the application directory.
pub const HOME_ENV: &str = "FOCUS_MODE_HOME";
/// Override for the live hosts file.
pub const HOSTS_ENV: &str = "FOCUS_MODE_HOSTS";

/// Return the system hosts file path.
pub fn hosts_file_path() -> PathBuf {
    if let Some(path) = std::env::var_os(HOSTS_ENV) {
        return PathBuf::from(path);
    }
    if cfg!(target_os = "windows") {
        let root = std::env::var("SystemRoot").unwrap_or_else(|_| r"C:\Windows".into());
        PathBuf::from(root).join(r"System32\drivers\etc\hosts")
    } else {
        PathBuf::from("/etc/hosts")
    }
}

/// Return the app's directory.
///   macOS / Linux: ~/.focusmode/
///   Windows:       %APPDATA%\FocusMode\
pub fn app_dir() -> PathBuf {
    if let Some(path) = std::env::var_os(HOME_ENV) {
        return PathBuf::from(path);
    }
    if cfg!(target_os = "windows") {
        directories::BaseDirs::new()
            .map(|b| b.config_dir().join("FocusMode"))
            .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData\FocusMode"))
    } else {
        directories::BaseDirs::new()
            .map(|b| b.home_dir().join(".focusmode"))
            .unwrap_or_else(|| PathBuf::from("/tmp/.focusmode"))
    }
}

/// Every file the application reads or writes.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub home: PathBuf,
    pub settings: PathBuf,
    pub credentials: PathBuf,
    pub clean_reference: PathBuf,
    pub blocked_reference: PathBuf,
    pub lock: PathBuf,
    pub live_hosts: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Self {
        Self::under(app_dir(), hosts_file_path())
    }

    pub fn under(home: impl Into<PathBuf>, live_hosts: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let refs = home.join("hosts");
        Self {
            settings: home.join("settings.json"),
            credentials: home.join("credentials.json"),
            clean_reference: refs.join("hosts.clean"),
            blocked_reference: refs.join("hosts.blocked"),
            lock: home.join("reconcile.lock"),
            live_hosts: live_hosts.into(),
            home,
        }
    }

    /// First run: nothing has been configured yet.
    pub fn is_first_run(&self) -> bool {
        !(self.settings.exists() && self.credentials.exists())
    }
}

/// Flush the OS DNS cache so hosts-file changes take effect immediately.
pub fn flush_dns() {
    if cfg!(target_os = "windows") {
        let _ = Command::new("ipconfig").arg("/flushdns").output();
    } else if cfg!(target_os = "macos") {
        let _ = Command::new("dscacheutil").arg("-flushcache").output();
        let _ = Command::new("killall")
            .args(["-HUP", "mDNSResponder"])
            .output();
    } else {
        let _ = Command::new("resolvectl").arg("flush-caches").output();
    }
}

/// Whether a narrow sudo rule lets us copy `src` over `dst` without a password.
///
/// `sudo -n -l <cmd>` only lists; it never runs the copy.
pub fn has_noninteractive_privilege(src: &Path, dst: &Path) -> bool {
    if cfg!(target_os = "windows") {
        return false;
    }
    Command::new("sudo")
        .args(["-n", "-l", "cp"])
        .arg(src)
        .arg(dst)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
