//! Password hashing, strength rules and rotation cooldown.
//!
//! Uses Argon2id with a cost chosen at construction time.

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};
use argon2::{Argon2, Params};
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_core::OsRng;
use thiserror::Error;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 10;

/// Maximum password length in characters.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Minimum time between two password rotations.
pub const PASSWORD_COOLDOWN_HOURS: i64 = 24;

/// Length of system-generated passwords.
pub const GENERATED_PASSWORD_LENGTH: usize = 16;

const LOWERCASE: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#$%^&*-_=+?";

/// Password hashing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Argon2 rejected the configured cost.
    #[error("invalid hashing parameters: {0}")]
    InvalidParams(String),

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    HashError(String),

    /// Stored hash could not be parsed.
    #[error("invalid password hash format")]
    InvalidHash,
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Argon2id password hasher with a fixed cost.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .finish()
    }
}

impl PasswordHasher {
    /// Create a hasher. Fails if Argon2 rejects the cost.
    pub fn new(cost: HashCost) -> Result<Self, PasswordError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            self.params.clone(),
        )
    }

    /// Hash a password.
    ///
    /// Returns a PHC-formatted string carrying the salt and parameters.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash.
    ///
    /// The cost is read from the hash itself, so hashes made with an older
    /// cost keep verifying.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::HashError(e.to_string())),
        }
    }
}

/// Check whether a password is strong enough.
///
/// Requires 10 to 128 characters with at least one lowercase letter, one
/// uppercase letter, one digit and one symbol.
pub fn validate_strength(password: &str) -> bool {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&len) {
        return false;
    }

    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    has_lower && has_upper && has_digit && has_symbol
}

/// Whole hours left before the password may be rotated again.
///
/// Returns `None` when rotation is allowed: never rotated, or rotated at
/// least 24 hours before `now`.
pub fn remaining_cooldown_hours(
    changed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<i64> {
    let changed_at = changed_at?;
    let remaining = changed_at + Duration::hours(PASSWORD_COOLDOWN_HOURS) - now;
    let millis = remaining.num_milliseconds();
    if millis <= 0 {
        return None;
    }
    const HOUR_MS: i64 = 3_600_000;
    Some((millis + HOUR_MS - 1) / HOUR_MS)
}

/// Generate a random password that passes [`validate_strength`].
pub fn generate_password() -> String {
    let mut rng = rand::rng();
    let pools = [LOWERCASE, UPPERCASE, DIGITS, SYMBOLS];

    // One character from every class, the rest from all of them
    let mut chars: Vec<char> = pools
        .iter()
        .map(|pool| pool[rng.random_range(0..pool.len())] as char)
        .collect();
    while chars.len() < GENERATED_PASSWORD_LENGTH {
        let pool = pools[rng.random_range(0..pools.len())];
        chars.push(pool[rng.random_range(0..pool.len())] as char);
    }
    chars.shuffle(&mut rng);
    chars.into_iter().collect()
}
