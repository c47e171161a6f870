//! Device verification codes.
//!
//! Seven-digit one-time codes for confirming a new device. Codes are short,
//! so they are stored as Argon2 hashes rather than plain digests.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use super::password::{PasswordError, PasswordHasher};
use super::reset_token::TokenStatus;
use crate::db::VerificationRecord;

/// Lifetime of a verification code.
pub const VERIFICATION_CODE_TTL_MINUTES: i64 = 10;

/// Generate a random seven-digit code.
pub fn generate_code() -> String {
    rand::rng().random_range(1_000_000..=9_999_999u32).to_string()
}

/// Hash `code` into a record expiring ten minutes after `now`.
pub fn record_for(
    hasher: &PasswordHasher,
    code: &str,
    now: DateTime<Utc>,
) -> Result<VerificationRecord, PasswordError> {
    Ok(VerificationRecord {
        code_hash: hasher.hash(code)?,
        expires_at: now + Duration::minutes(VERIFICATION_CODE_TTL_MINUTES),
    })
}

/// Check a presented code against the stored record.
pub fn check(
    hasher: &PasswordHasher,
    stored: Option<&VerificationRecord>,
    code: &str,
    now: DateTime<Utc>,
) -> Result<TokenStatus, PasswordError> {
    let Some(stored) = stored else {
        return Ok(TokenStatus::Invalid);
    };
    if stored.expires_at < now {
        return Ok(TokenStatus::Expired);
    }
    if hasher.verify(code, &stored.code_hash)? {
        Ok(TokenStatus::Valid)
    } else {
        Ok(TokenStatus::Invalid)
    }
}
