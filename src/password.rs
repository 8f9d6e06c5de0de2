//! Password hashing via Argon2 and the on-disk credential store.

use crate::auth::Verifier;
use crate::AppError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Hash a plaintext password with Argon2id and a random salt.
pub fn hash(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Password(format!("Hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored Argon2 hash string.
pub fn verify(password: &str, hash_str: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash_str)
        .map_err(|e| AppError::Password(format!("Invalid hash format: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Recovery {
    pub question: String,
    pub answer_hash: String,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Credentials {
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub recovery: Option<Recovery>,
}

/// `credentials.json`. Re-read on every verification so a password reset
/// from another process takes effect immediately.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Credentials, AppError> {
        if !self.path.exists() {
            return Ok(Credentials::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data)
            .map_err(|e| AppError::Password(format!("Invalid credential file: {e}")))
    }

    pub fn save(&self, credentials: &Credentials) -> Result<(), AppError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(credentials)?)?;
        Ok(())
    }

    pub fn has_password(&self) -> Result<bool, AppError> {
        Ok(self.load()?.password_hash.is_some())
    }

    pub fn set_password(&self, password: &str) -> Result<(), AppError> {
        if password.trim().is_empty() {
            return Err(AppError::Password("Password cannot be empty".into()));
        }
        let mut creds = self.load()?;
        creds.password_hash = Some(hash(password)?);
        self.save(&creds)
    }

    pub fn set_recovery(&self, question: &str, answer: &str) -> Result<(), AppError> {
        let (question, answer) = (question.trim(), answer.trim());
        if question.is_empty() || answer.is_empty() {
            return Err(AppError::Password(
                "Recovery question and answer cannot be empty".into(),
            ));
        }
        let mut creds = self.load()?;
        creds.recovery = Some(Recovery {
            question: question.to_string(),
            answer_hash: hash(answer)?,
        });
        self.save(&creds)
    }

    pub fn recovery_question(&self) -> Result<Option<String>, AppError> {
        Ok(self.load()?.recovery.map(|r| r.question))
    }

    pub fn verify_recovery_answer(&self, answer: &str) -> Result<bool, AppError> {
        match self.load()?.recovery {
            Some(recovery) => verify(answer.trim(), &recovery.answer_hash),
            None => Err(AppError::Password("No recovery question configured".into())),
        }
    }
}

impl Verifier for CredentialStore {
    fn verify(&self, candidate: &str) -> Result<bool, AppError> {
        match self.load()?.password_hash {
            Some(stored) => verify(candidate, &stored),
            None => Err(AppError::Password("No password configured".into())),
        }
    }
}
