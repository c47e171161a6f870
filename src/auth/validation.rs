//! Input validation for registration and profile updates.

use thiserror::Error;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Maximum profile description length.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid email format")]
    EmailInvalidFormat,

    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    #[error("username cannot be empty")]
    UsernameEmpty,

    #[error("username must be at most {MAX_USERNAME_LENGTH} characters")]
    UsernameTooLong,

    #[error("username can only contain letters and underscores")]
    UsernameInvalidChars,

    #[error("description must be at most {MAX_DESCRIPTION_LENGTH} characters")]
    DescriptionTooLong,
}

/// Canonical form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an email address.
///
/// Requirements:
/// - At most 254 characters
/// - Exactly one `@` with a non-empty local part
/// - A domain containing a dot, not starting or ending with one
/// - No whitespace
///
/// # Examples
///
/// ```
/// use desksync::auth::validation::validate_email;
///
/// assert!(validate_email("a@b.com").is_ok());
/// assert!(validate_email("a@b").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }
    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ValidationError::EmailInvalidFormat);
    };

    if local.is_empty()
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || domain.contains("..")
    {
        return Err(ValidationError::EmailInvalidFormat);
    }

    Ok(())
}

/// Registration allow-list by email domain.
#[derive(Debug, Clone, Default)]
pub struct EmailPolicy {
    allowed_domains: Vec<String>,
}

impl EmailPolicy {
    /// An empty list allows every domain.
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_domains: domains
                .into_iter()
                .map(|d| d.as_ref().trim().trim_start_matches('@').to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Whether the (already validated) address may register.
    pub fn is_allowed(&self, email: &str) -> bool {
        if self.allowed_domains.is_empty() {
            return true;
        }
        let Some((_, domain)) = email.rsplit_once('@') else {
            return false;
        };
        let domain = domain.to_lowercase();
        self.allowed_domains.iter().any(|d| *d == domain)
    }
}

/// Base username for a new account, taken from the email local part.
///
/// Keeps ASCII letters, digits, `_`, `.` and `-`; falls back to `user`.
pub fn derive_username(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let name: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .take(MAX_USERNAME_LENGTH)
        .collect();

    if name.is_empty() {
        "user".to_string()
    } else {
        name
    }
}

/// Validate a username chosen on the profile page.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::UsernameEmpty);
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }
    if !username.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
        return Err(ValidationError::UsernameInvalidChars);
    }
    Ok(())
}

/// Validate a profile description.
pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooLong);
    }
    Ok(())
}
