//! Engine error kinds.

use thiserror::Error;

use super::password::PasswordError;
use super::policy::PolicyError;
use super::session::SessionError;
use super::validation::ValidationError;
use crate::DeskSyncError;

/// Broad class of a failure, used by callers to pick a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed or unacceptable input.
    InvalidInput,
    /// Not authenticated, or not allowed to do this.
    Forbidden,
    /// Missing record or a state that blocks the request.
    Conflict,
    /// Storage, hashing or signing failure.
    Internal,
}

/// Every way an engine operation can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Please fill in all mandatory fields ({0})")]
    MissingField(&'static str),

    #[error("{0}")]
    InvalidInput(#[from] ValidationError),

    #[error("Email not allowed")]
    EmailNotAllowed,

    #[error(
        "Password must be at least 10 characters long and mix upper and lower case letters, digits and symbols"
    )]
    WeakPassword,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Current password is incorrect")]
    IncorrectCurrentPassword,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Your account is suspended")]
    AccountSuspended,

    #[error("Session expired. Please log in again")]
    Unauthorized,

    #[error("You cannot perform this action on your own account")]
    SelfTarget,

    #[error("{0}")]
    PermissionDenied(PolicyError),

    #[error("User not found")]
    AccountNotFound,

    #[error("User already exists")]
    DuplicateAccount,

    #[error("Invalid password reset link")]
    InvalidResetToken,

    #[error("Password reset link has expired")]
    ResetTokenExpired,

    #[error("Password was changed recently. Try again in {remaining_hours} hour(s)")]
    CooldownActive { remaining_hours: i64 },

    #[error("User is already disabled")]
    AlreadyDisabled,

    #[error("User is already enabled")]
    AlreadyEnabled,

    #[error("Invalid action: the initial password has already been changed")]
    FirstLoginAlreadyCompleted,

    #[error("Invalid verification code")]
    InvalidVerificationCode,

    #[error("Verification code has expired")]
    VerificationCodeExpired,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Broad class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            AuthError::MissingField(_)
            | AuthError::InvalidInput(_)
            | AuthError::EmailNotAllowed
            | AuthError::WeakPassword
            | AuthError::PasswordMismatch
            | AuthError::IncorrectCurrentPassword => ErrorClass::InvalidInput,

            AuthError::InvalidCredentials
            | AuthError::AccountSuspended
            | AuthError::Unauthorized
            | AuthError::SelfTarget
            | AuthError::PermissionDenied(_) => ErrorClass::Forbidden,

            AuthError::AccountNotFound
            | AuthError::DuplicateAccount
            | AuthError::InvalidResetToken
            | AuthError::ResetTokenExpired
            | AuthError::CooldownActive { .. }
            | AuthError::AlreadyDisabled
            | AuthError::AlreadyEnabled
            | AuthError::FirstLoginAlreadyCompleted
            | AuthError::InvalidVerificationCode
            | AuthError::VerificationCodeExpired => ErrorClass::Conflict,

            AuthError::Internal(_) => ErrorClass::Internal,
        }
    }
}

impl From<PolicyError> for AuthError {
    fn from(e: PolicyError) -> Self {
        match e {
            PolicyError::SelfTarget => AuthError::SelfTarget,
            PolicyError::AlreadyDisabled => AuthError::AlreadyDisabled,
            PolicyError::AlreadyEnabled => AuthError::AlreadyEnabled,
            other => AuthError::PermissionDenied(other),
        }
    }
}

impl From<DeskSyncError> for AuthError {
    fn from(e: DeskSyncError) -> Self {
        match e {
            DeskSyncError::Conflict(_) => AuthError::DuplicateAccount,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(e: PasswordError) -> Self {
        AuthError::Internal(e.to_string())
    }
}

impl From<SessionError> for AuthError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Invalid | SessionError::Expired => AuthError::Unauthorized,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::policy::AdminAction;
    use crate::db::Role;

    #[test]
    fn test_cooldown_message_carries_hours() {
        let err = AuthError::CooldownActive { remaining_hours: 3 };
        assert_eq!(
            err.to_string(),
            "Password was changed recently. Try again in 3 hour(s)"
        );
        assert_eq!(err.class(), ErrorClass::Conflict);
    }

    #[test]
    fn test_policy_errors_map_to_distinct_kinds() {
        assert_eq!(AuthError::from(PolicyError::SelfTarget), AuthError::SelfTarget);
        assert_eq!(
            AuthError::from(PolicyError::AlreadyDisabled),
            AuthError::AlreadyDisabled
        );
        let forbidden = PolicyError::Forbidden {
            actor: Role::Admin,
            target: Role::Admin,
            action: AdminAction::Disable,
        };
        assert_eq!(
            AuthError::from(forbidden),
            AuthError::PermissionDenied(forbidden)
        );
    }

    #[test]
    fn test_session_errors_collapse_to_unauthorized() {
        assert_eq!(AuthError::from(SessionError::Expired), AuthError::Unauthorized);
        assert_eq!(AuthError::from(SessionError::Invalid), AuthError::Unauthorized);
        assert!(matches!(
            AuthError::from(SessionError::Signing("boom".into())),
            AuthError::Internal(_)
        ));
    }

    #[test]
    fn test_store_conflict_is_duplicate() {
        let err = AuthError::from(DeskSyncError::Conflict("UNIQUE".into()));
        assert_eq!(err, AuthError::DuplicateAccount);
        let err = AuthError::from(DeskSyncError::Database("locked".into()));
        assert_eq!(err.class(), ErrorClass::Internal);
    }

    #[test]
    fn test_classes() {
        assert_eq!(AuthError::WeakPassword.class(), ErrorClass::InvalidInput);
        assert_eq!(AuthError::EmailNotAllowed.class(), ErrorClass::InvalidInput);
        assert_eq!(AuthError::InvalidCredentials.class(), ErrorClass::Forbidden);
        assert_eq!(AuthError::AccountSuspended.class(), ErrorClass::Forbidden);
        assert_eq!(AuthError::AccountNotFound.class(), ErrorClass::Conflict);
        assert_eq!(AuthError::AlreadyEnabled.class(), ErrorClass::Conflict);
    }
}
