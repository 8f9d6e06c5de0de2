//! First-run setup and password recovery.

use crate::config;
use crate::console::{self, Input};
use crate::hosts_manager;
use crate::password::CredentialStore;
use crate::platform::{self, AppPaths};
use crate::AppError;

/// Guided first-time setup: recovery question, password, default settings,
/// hosts references. Anything already in place is kept.
pub fn run_setup(paths: &AppPaths, input: &dyn Input) -> Result<(), AppError> {
    println!("Focus Mode — Initial Setup");
    println!("--------------------------");

    let store = CredentialStore::new(&paths.credentials);

    if store.recovery_question()?.is_none() {
        set_recovery(&store, input)?;
    }

    if !store.has_password()? {
        let password = console::confirmed_secret(input, "Create a password: ")?
            .ok_or_else(|| AppError::Password("Setup cancelled".into()))?;
        store.set_password(&password)?;
        log::info!("Password hash saved");
    } else {
        println!("Password already configured.");
    }

    if !paths.settings.exists() {
        config::save(&paths.settings, &config::Settings::default())
            .map_err(|e| AppError::Config(format!("Cannot create default settings: {e}")))?;
        log::info!("Default settings written to {}", paths.settings.display());
    }

    prepare_references(paths)?;

    if !platform::has_noninteractive_privilege(&paths.blocked_reference, &paths.live_hosts) {
        log::warn!("No passwordless rule for copying into {}", paths.live_hosts.display());
        println!(
            "Scheduled changes need permission to write {live} without a prompt.\n\
             Add a sudoers rule such as:\n  \
             {user} ALL=(root) NOPASSWD: /bin/cp {home}/hosts/hosts.* {live}",
            live = paths.live_hosts.display(),
            user = std::env::var("USER").unwrap_or_else(|_| "<user>".into()),
            home = paths.home.display(),
        );
    }

    println!("Setup complete. Config directory: {}", paths.home.display());
    Ok(())
}

/// Make sure both reference files exist.
pub fn prepare_references(paths: &AppPaths) -> Result<(), AppError> {
    hosts_manager::ensure_clean_reference(paths)?;
    if !paths.blocked_reference.exists() {
        let settings = config::load(&paths.settings);
        hosts_manager::render_blocked_reference(paths, &settings.blocked_sites)?;
    }
    Ok(())
}

fn set_recovery(store: &CredentialStore, input: &dyn Input) -> Result<(), AppError> {
    let question = input
        .line("Set a secret recovery question: ")
        .ok_or_else(|| AppError::Password("Setup cancelled".into()))?;
    let answer = input
        .secret("Answer to your secret question: ")
        .ok_or_else(|| AppError::Password("Setup cancelled".into()))?;
    store.set_recovery(&question, &answer)?;
    log::info!("Recovery question saved");
    Ok(())
}

/// Reset the password after answering the secret question. With no question
/// on record, set one up instead.
pub fn reset_password(paths: &AppPaths, input: &dyn Input) -> Result<(), AppError> {
    let store = CredentialStore::new(&paths.credentials);

    let Some(question) = store.recovery_question()? else {
        println!("No recovery question is set; creating one.");
        set_recovery(&store, input)?;
        println!("You can now use it to reset your password.");
        return Ok(());
    };

    let Some(answer) = input.secret(&format!("{question} ")) else {
        log::info!("Password reset cancelled");
        return Ok(());
    };

    if !store.verify_recovery_answer(&answer)? {
        log::warn!("Recovery answer rejected");
        println!("Incorrect answer to secret question.");
        return Ok(());
    }

    match console::confirmed_secret(input, "New password: ")? {
        Some(password) => {
            store.set_password(&password)?;
            log::info!("Password reset via recovery question");
            println!("Password updated successfully.");
        }
        None => println!("New password not entered; unchanged."),
    }
    Ok(())
}
