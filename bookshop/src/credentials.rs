//! Password hashing for stored user records.
//!
//! Passwords are hashed with bcrypt at a fixed work factor. Plaintexts longer
//! than bcrypt's 72-byte input limit are refused rather than truncated, so two
//! long passwords sharing a prefix never collide.

use std::sync::LazyLock;

use serde::Deserialize;
use thiserror::Error;
use tokio::task::JoinError;

/// bcrypt work factor. Fixed; not configurable at runtime.
pub const HASH_COST: u32 = 10;

// Stands in for the stored hash when a login names an unknown user.
static UNKNOWN_USER_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("unknown-user-placeholder").ok());

/// Nickname/password pair read from a signup or login body.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub nickname: String,
    pub password: String,
}

impl Credentials {
    /// Trims the nickname and rejects empty fields.
    pub fn normalized(self) -> Option<Self> {
        let nickname = self.nickname.trim().to_string();
        if nickname.is_empty() || self.password.is_empty() {
            return None;
        }
        Some(Self {
            nickname,
            password: self.password,
        })
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("{0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("password does not match")]
    Mismatch,
    #[error("password worker failed: {0}")]
    Worker(#[from] JoinError),
}

pub fn hash_password(plaintext: &str) -> Result<String, CredentialError> {
    Ok(bcrypt::non_truncating_hash(plaintext, HASH_COST)?)
}

/// Checks `plaintext` against a stored bcrypt hash in constant time.
///
/// A malformed stored hash or an over-long plaintext is reported as
/// [`CredentialError::Hash`]; callers treat both variants as a failed login.
pub fn verify_password(hash: &str, plaintext: &str) -> Result<(), CredentialError> {
    if bcrypt::non_truncating_verify(plaintext, hash)? {
        Ok(())
    } else {
        Err(CredentialError::Mismatch)
    }
}

/// [`hash_password`] on the blocking pool, off the async workers.
pub async fn hash_in_background(plaintext: String) -> Result<String, CredentialError> {
    tokio::task::spawn_blocking(move || hash_password(&plaintext)).await?
}

/// [`verify_password`] on the blocking pool.
///
/// With no stored hash the plaintext is still checked against a placeholder
/// hash and the result is always [`CredentialError::Mismatch`], so an unknown
/// nickname costs as much as a wrong password.
pub async fn verify_in_background(
    hash: Option<String>,
    plaintext: String,
) -> Result<(), CredentialError> {
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&hash, &plaintext),
        None => {
            if let Some(placeholder) = UNKNOWN_USER_HASH.as_deref() {
                let _ = verify_password(placeholder, &plaintext);
            }
            Err(CredentialError::Mismatch)
        }
    })
    .await?
}
