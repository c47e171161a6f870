//! Request DTOs for the HTTP API.
//!
//! String fields default to empty so that a missing field reaches the
//! engine and is reported as a missing mandatory field. Length and format
//! rules for credentials, emails and profile fields are enforced by the
//! engine, where a rejection is audited like any other failed attempt.

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::db::Role;

/// Registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
}

/// Login request. `identifier` is an email or a username.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default, alias = "email", alias = "username")]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
}

/// Forgot-password request.
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

/// New password submitted through a reset link.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Password change for a logged-in account.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// First-login password replacement.
#[derive(Debug, Deserialize, Validate)]
pub struct FirstPasswordRequest {
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Profile update. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Notification preference update.
#[derive(Debug, Deserialize, Validate)]
pub struct NotificationPreferenceRequest {
    pub receiving_email: bool,
}

/// Role assignment by an administrator.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangeRoleRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_role"))]
    pub role: String,
}

impl ChangeRoleRequest {
    /// The requested role, if it names one.
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

fn validate_role(role: &str) -> Result<(), ValidationError> {
    if role.parse::<Role>().is_ok() {
        return Ok(());
    }
    let mut error = ValidationError::new("unknown_role");
    error.message = Some("Role must be one of user, om, admin, superadmin".into());
    Err(error)
}

/// Device verification code request.
#[derive(Debug, Deserialize, Validate)]
pub struct VerificationRequest {
    #[serde(default)]
    pub email: String,
}

/// Device verification code confirmation.
#[derive(Debug, Deserialize, Validate)]
pub struct VerificationConfirmRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}
