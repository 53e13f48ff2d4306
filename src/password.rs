//! Salted one-way password hashing.

use std::sync::LazyLock;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::error::{Error, Result};
use crate::models::Account;

/// Verified against when a login names no account.
static PLACEHOLDER_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("no account has this password").ok());

/// Hashes `password` with Argon2id and a fresh random salt, returning the PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| Error::PasswordHash(err.to_string()))
}

/// Checks `password` against a stored PHC string. A malformed hash never verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            tracing::warn!(error = %err, "stored password hash is malformed");
            false
        }
    }
}

/// Checks `password` against the account a lookup returned, if any.
///
/// An unknown account still costs one Argon2 verification, so a failed login takes as long
/// whether or not the email is registered. Every failure is [`Error::InvalidCredentials`].
pub fn check_credentials<A: Account>(account: Option<A>, password: &str) -> Result<A> {
    match account {
        Some(account) if verify_password(password, account.password_hash()) => Ok(account),
        Some(_) => Err(Error::InvalidCredentials),
        None => {
            if let Some(placeholder) = PLACEHOLDER_HASH.as_deref() {
                verify_password(password, placeholder);
            }
            Err(Error::InvalidCredentials)
        }
    }
}
