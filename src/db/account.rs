//! Account model for DeskSync.
//!
//! Defines the Account record, the Role enumeration and the embedded
//! reset-token and verification-code grants.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// Account role.
///
/// Only these four values are ever accepted or returned. Ordering between
/// roles is decided in [`crate::auth::policy`], not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular workspace user.
    #[default]
    User,
    /// Office manager.
    Om,
    /// Administrator.
    Admin,
    /// Super administrator.
    Superadmin,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 4] = [Role::User, Role::Om, Role::Admin, Role::Superadmin];

    /// Convert role to its database and wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Om => "om",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "om" => Ok(Role::Om),
            "admin" => Ok(Role::Admin),
            "superadmin" => Ok(Role::Superadmin),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// Outstanding password-reset grant. Only the hash of the secret is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetTokenRecord {
    /// Hex-encoded SHA-256 of the raw secret.
    pub token_hash: String,
    /// Absolute expiry instant.
    pub expires_at: DateTime<Utc>,
}

/// Outstanding device verification code. Only its Argon2 hash is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRecord {
    /// PHC-formatted hash of the code.
    pub code_hash: String,
    /// Absolute expiry instant.
    pub expires_at: DateTime<Utc>,
}

/// Account entity.
#[derive(Debug, Clone)]
pub struct Account {
    /// Unique account ID.
    pub id: i64,
    /// Unique username.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Argon2 password hash. `None` until the first credential is set.
    pub password_hash: Option<String>,
    /// Role for authorization decisions.
    pub role: Role,
    /// Whether the account is suspended.
    pub is_disabled: bool,
    /// Free-form profile description.
    pub description: Option<String>,
    /// Whether the holder receives notification emails.
    pub receiving_email: bool,
    /// Last password rotation. `None` means the first login must set a password.
    pub password_changed_at: Option<DateTime<Utc>>,
    /// Outstanding reset grant.
    pub reset_token: Option<ResetTokenRecord>,
    /// Outstanding device verification code.
    pub verification: Option<VerificationRecord>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Whether the holder still has to replace the generated password.
    pub fn must_change_password(&self) -> bool {
        self.password_changed_at.is_none()
    }
}

impl<'r> FromRow<'r, SqliteRow> for Account {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        let role = Role::from_str(&role).map_err(|e| sqlx::Error::ColumnDecode {
            index: "role".to_string(),
            source: e.into(),
        })?;

        let reset_hash: Option<String> = row.try_get("reset_token_hash")?;
        let reset_expires: Option<DateTime<Utc>> = row.try_get("reset_token_expires_at")?;
        let reset_token = match (reset_hash, reset_expires) {
            (Some(token_hash), Some(expires_at)) => Some(ResetTokenRecord {
                token_hash,
                expires_at,
            }),
            _ => None,
        };

        let code_hash: Option<String> = row.try_get("verification_code_hash")?;
        let code_expires: Option<DateTime<Utc>> = row.try_get("verification_expires_at")?;
        let verification = match (code_hash, code_expires) {
            (Some(code_hash), Some(expires_at)) => Some(VerificationRecord {
                code_hash,
                expires_at,
            }),
            _ => None,
        };

        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role,
            is_disabled: row.try_get("is_disabled")?,
            description: row.try_get("description")?,
            receiving_email: row.try_get("receiving_email")?,
            password_changed_at: row.try_get("password_changed_at")?,
            reset_token,
            verification,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Data for creating a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Role (defaults to `user`).
    pub role: Role,
}

impl NewAccount {
    /// Create a new account with the default role.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role: Role::User,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Data for updating an existing account.
///
/// `Option<Option<_>>` fields distinguish "leave unchanged" from "clear".
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub username: Option<String>,
    pub description: Option<Option<String>>,
    pub password_hash: Option<String>,
    pub password_changed_at: Option<Option<DateTime<Utc>>>,
    pub role: Option<Role>,
    pub is_disabled: Option<bool>,
    pub receiving_email: Option<bool>,
    pub reset_token: Option<Option<ResetTokenRecord>>,
    pub verification: Option<Option<VerificationRecord>>,
}

impl AccountUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set new description.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Replace the credential and stamp the rotation time.
    pub fn password(mut self, password_hash: impl Into<String>, changed_at: DateTime<Utc>) -> Self {
        self.password_hash = Some(password_hash.into());
        self.password_changed_at = Some(Some(changed_at));
        self
    }

    /// Set new role.
    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Set suspension status.
    pub fn is_disabled(mut self, is_disabled: bool) -> Self {
        self.is_disabled = Some(is_disabled);
        self
    }

    /// Set notification preference.
    pub fn receiving_email(mut self, receiving_email: bool) -> Self {
        self.receiving_email = Some(receiving_email);
        self
    }

    /// Set or clear the reset grant.
    pub fn reset_token(mut self, token: Option<ResetTokenRecord>) -> Self {
        self.reset_token = Some(token);
        self
    }

    /// Set or clear the verification code.
    pub fn verification(mut self, verification: Option<VerificationRecord>) -> Self {
        self.verification = Some(verification);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.description.is_none()
            && self.password_hash.is_none()
            && self.password_changed_at.is_none()
            && self.role.is_none()
            && self.is_disabled.is_none()
            && self.receiving_email.is_none()
            && self.reset_token.is_none()
            && self.verification.is_none()
    }

    /// Apply this update to an in-memory account.
    pub fn apply_to(&self, account: &mut Account) {
        if let Some(username) = &self.username {
            account.username = username.clone();
        }
        if let Some(description) = &self.description {
            account.description = description.clone();
        }
        if let Some(hash) = &self.password_hash {
            account.password_hash = Some(hash.clone());
        }
        if let Some(changed_at) = self.password_changed_at {
            account.password_changed_at = changed_at;
        }
        if let Some(role) = self.role {
            account.role = role;
        }
        if let Some(is_disabled) = self.is_disabled {
            account.is_disabled = is_disabled;
        }
        if let Some(receiving_email) = self.receiving_email {
            account.receiving_email = receiving_email;
        }
        if let Some(token) = &self.reset_token {
            account.reset_token = token.clone();
        }
        if let Some(verification) = &self.verification {
            account.verification = verification.clone();
        }
    }
}
