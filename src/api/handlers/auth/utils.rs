//! Small helpers for credential validation, password hashing and session tokens.

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{self, SaltString},
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::sync::OnceLock;

pub(super) const MIN_PASSWORD_CHARS: usize = 8;
const USERNAME_CHARS: std::ops::RangeInclusive<usize> = 3..=32;

#[cfg(not(test))]
const MEMORY_COST_KIB: u32 = 19 * 1024;
#[cfg(not(test))]
const TIME_COST: u32 = 2;
// Unit tests hash many passwords in debug builds.
#[cfg(test)]
const MEMORY_COST_KIB: u32 = 1024;
#[cfg(test)]
const TIME_COST: u32 = 1;
const PARALLELISM: u32 = 1;

type HmacSha256 = Hmac<Sha256>;

/// Normalize an email for lookup/uniqueness checks.
pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Usernames are 3 to 32 characters once trimmed.
pub(super) fn valid_username(username: &str) -> bool {
    USERNAME_CHARS.contains(&username.chars().count())
}

pub(super) fn valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_CHARS
}

fn argon2_config() -> Result<Argon2<'static>, password_hash::Error> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password with Argon2id and return the PHC string.
pub(super) fn hash_password(plaintext: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = argon2_config()?;
    Ok(argon2.hash_password(plaintext.as_bytes(), &salt)?.to_string())
}

/// Verify a password against a stored PHC string; malformed hashes never match.
pub(super) fn verify_password(plaintext: &str, stored_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(stored_hash) else {
        return false;
    };

    // Parameters come from the PHC string, so older hashes keep verifying.
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed_hash)
        .is_ok()
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    DUMMY_HASH
        .get_or_init(|| hash_password("screener-unknown-login").ok())
        .as_deref()
}

/// Pay the cost of a real verification when the login matches no user.
/// Always returns `false`.
pub(super) fn verify_unknown_login(plaintext: &str) -> bool {
    if let Some(hash) = dummy_hash() {
        let _ = verify_password(plaintext, hash);
    }
    false
}

/// Create a new session token for the auth cookie.
/// The raw value is only returned to the client; the database stores a digest.
pub(crate) fn generate_session_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// HMAC-SHA256 of a session token keyed by the server secret.
pub(crate) fn hash_session_token(secret_key: &SecretString, token: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret_key.expose_secret().as_bytes())
        .map_err(|_| anyhow!("invalid session key"))?;
    mac.update(token.as_bytes());
    Ok(Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes()))
}
