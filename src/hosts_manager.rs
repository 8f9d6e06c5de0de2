//! Hosts-file reference content and the block-state oracle.
//!
//! The live hosts file is never edited in place. Two reference files hold
//! complete contents: the clean copy and the blocked copy. The blocked copy
//! is the clean copy plus a marker-delimited block of redirect entries.
//! Whether the system is blocked is derived from content every time it is
//! asked, so edits made by other software are picked up on the next read.

use crate::platform::AppPaths;
use crate::AppError;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

const MARKER_START: &str = "# FocusMode Start";
const MARKER_END: &str = "# FocusMode End";

/// Build the marker-delimited block for the given domains.
fn build_block(domains: &[String]) -> String {
    if domains.is_empty() {
        return String::new();
    }

    let mut block = format!("{MARKER_START}\n");
    for domain in domains {
        block.push_str(&format!("127.0.0.1 {domain}\n"));
        // Cover the www subdomain unless the entry already is www.
        if !domain.starts_with("www.") {
            block.push_str(&format!("127.0.0.1 www.{domain}\n"));
        }
    }
    block.push_str(MARKER_END);
    block
}

/// Remove every line between (and including) the FocusMode markers.
fn strip_block(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut inside = false;

    for line in content.lines() {
        if line.trim() == MARKER_START {
            inside = true;
            continue;
        }
        if line.trim() == MARKER_END {
            inside = false;
            continue;
        }
        if !inside {
            out.push_str(line);
            out.push('\n');
        }
    }

    out
}

/// Clean content with our block for `domains` appended.
pub fn compose_blocked(clean: &str, domains: &[String]) -> String {
    let mut base = strip_block(clean);
    if !base.is_empty() && !base.ends_with('\n') {
        base.push('\n');
    }
    let block = build_block(domains);
    if block.is_empty() {
        base
    } else {
        format!("{base}{block}\n")
    }
}

fn read_resource(path: &Path) -> Result<Vec<u8>, AppError> {
    fs::read(path).map_err(|source| AppError::ResourceRead {
        path: path.to_path_buf(),
        source,
    })
}

fn write_reference(path: &Path, content: &str) -> Result<(), AppError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Snapshot the live hosts file as the clean reference, unless one exists.
/// Any FocusMode block already present in the live file is left out.
pub fn ensure_clean_reference(paths: &AppPaths) -> Result<bool, AppError> {
    if paths.clean_reference.exists() {
        return Ok(false);
    }
    let live = read_resource(&paths.live_hosts)?;
    let clean = strip_block(&String::from_utf8_lossy(&live));
    write_reference(&paths.clean_reference, &clean)?;
    log::info!(
        "Saved clean hosts reference to {}",
        paths.clean_reference.display()
    );
    Ok(true)
}

/// Rewrite the blocked reference from the clean reference and `domains`.
pub fn render_blocked_reference(paths: &AppPaths, domains: &[String]) -> Result<(), AppError> {
    let clean = read_resource(&paths.clean_reference)?;
    let blocked = compose_blocked(&String::from_utf8_lossy(&clean), domains);
    write_reference(&paths.blocked_reference, &blocked)?;
    log::info!(
        "Rendered blocked hosts reference with {} domain(s)",
        domains.len()
    );
    Ok(())
}

/// Hex SHA-256 of a file's full contents.
pub fn digest(path: &Path) -> Result<String, AppError> {
    let bytes = read_resource(path)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Derives the restriction state from the live file's content.
#[derive(Debug, Clone)]
pub struct Oracle {
    live: PathBuf,
    blocked_reference: PathBuf,
    clean_reference: PathBuf,
}

impl Oracle {
    pub fn new(paths: &AppPaths) -> Self {
        Self {
            live: paths.live_hosts.clone(),
            blocked_reference: paths.blocked_reference.clone(),
            clean_reference: paths.clean_reference.clone(),
        }
    }

    /// True when the live file is byte-identical to the blocked reference
    /// and that reference actually restricts something. Nothing is cached
    /// between calls.
    pub fn is_blocked(&self) -> Result<bool, AppError> {
        Ok(self.live_matches_blocked()? && self.has_restrictions()?)
    }

    pub fn live_matches_blocked(&self) -> Result<bool, AppError> {
        Ok(digest(&self.live)? == digest(&self.blocked_reference)?)
    }

    /// False when the blocked reference equals the clean one (empty site list).
    pub fn has_restrictions(&self) -> Result<bool, AppError> {
        Ok(digest(&self.blocked_reference)? != digest(&self.clean_reference)?)
    }
}
