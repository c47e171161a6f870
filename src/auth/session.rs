//! Stateless session tokens.
//!
//! Tokens are HS256 JWTs carrying the account id and role. There is no
//! server-side session table, so a token stays valid until it expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::Role;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (account ID).
    pub sub: i64,
    /// Role at issuance. Authorization decisions use the live record instead.
    pub role: Role,
    /// Issued at (Unix seconds).
    pub iat: u64,
    /// Expiration (Unix seconds).
    pub exp: u64,
    /// Token ID.
    pub jti: String,
}

/// Session token errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session signing secret is not configured")]
    MissingSecret,

    #[error("session lifetime must be positive")]
    InvalidLifetime,

    #[error("session token is invalid")]
    Invalid,

    #[error("session token has expired")]
    Expired,

    #[error("session token signing failed: {0}")]
    Signing(String),
}

/// Issues and verifies session tokens with one shared secret.
#[derive(Clone)]
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionTokens {
    /// Create a token service. Fails on an empty secret or zero lifetime.
    pub fn new(secret: &str, ttl_secs: u64) -> Result<Self, SessionError> {
        if secret.is_empty() {
            return Err(SessionError::MissingSecret);
        }
        let ttl_secs = i64::try_from(ttl_secs).map_err(|_| SessionError::InvalidLifetime)?;
        if ttl_secs == 0 {
            return Err(SessionError::InvalidLifetime);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::seconds(ttl_secs),
        })
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for an account, valid from now.
    pub fn issue(&self, account_id: i64, role: Role) -> Result<String, SessionError> {
        self.issue_at(account_id, role, Utc::now())
    }

    /// Issue a token as if it were `now`.
    pub fn issue_at(
        &self,
        account_id: i64,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, SessionError> {
        let claims = SessionClaims {
            sub: account_id,
            role,
            iat: now.timestamp().max(0) as u64,
            exp: (now + self.ttl).timestamp().max(0) as u64,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SessionError::Signing(e.to_string()))
    }

    /// Verify signature and expiry.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Invalid,
            })
    }
}
