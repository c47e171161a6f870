//! Password-reset grants.
//!
//! A grant is a 256-bit random secret sent to the account holder once. Only
//! its SHA-256 digest and an expiry ten minutes out are stored.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::db::ResetTokenRecord;

/// Lifetime of a reset grant.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

/// Secret length in bytes.
const SECRET_BYTES: usize = 32;

/// Result of checking a presented secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Valid,
    Invalid,
    Expired,
}

/// Freshly issued grant: the raw secret for transmission and the record to store.
#[derive(Debug)]
pub struct IssuedResetToken {
    pub secret: String,
    pub record: ResetTokenRecord,
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Hex SHA-256 digest of a secret.
pub fn hash_secret(secret: &str) -> String {
    hex_encode(&Sha256::digest(secret.as_bytes()))
}

/// Issue a new grant expiring ten minutes after `now`.
///
/// Storing the returned record replaces any earlier grant.
pub fn issue(now: DateTime<Utc>) -> IssuedResetToken {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let secret = hex_encode(&bytes);

    let record = ResetTokenRecord {
        token_hash: hash_secret(&secret),
        expires_at: now + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
    };
    IssuedResetToken { secret, record }
}

/// Check a presented secret against the stored grant.
///
/// An expired grant reports `Expired` whatever secret is presented; a live
/// grant reports `Invalid` unless the digests match.
pub fn validate(
    stored: Option<&ResetTokenRecord>,
    presented: &str,
    now: DateTime<Utc>,
) -> TokenStatus {
    let Some(stored) = stored else {
        return TokenStatus::Invalid;
    };

    let presented_hash = hash_secret(presented);
    let matches: bool = presented_hash
        .as_bytes()
        .ct_eq(stored.token_hash.as_bytes())
        .into();

    if stored.expires_at < now {
        TokenStatus::Expired
    } else if matches {
        TokenStatus::Valid
    } else {
        TokenStatus::Invalid
    }
}
