//! Outbound message requests.
//!
//! The engine asks for a message to reach an account holder by emitting a
//! [`DeliveryRequest`]. A [`DeliveryChannel`] transports it.

use std::fmt;

use async_trait::async_trait;

use crate::Result;

/// Kind of message being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryKind {
    /// Generated password for a newly registered account.
    Credentials,
    /// Password reset link.
    ResetLink,
    /// Notice that the password was reset.
    ResetConfirmation,
    /// Device verification code.
    VerificationCode,
}

impl DeliveryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryKind::Credentials => "credentials",
            DeliveryKind::ResetLink => "reset_link",
            DeliveryKind::ResetConfirmation => "reset_confirmation",
            DeliveryKind::VerificationCode => "verification_code",
        }
    }
}

impl fmt::Display for DeliveryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message content. Secrets live here and are redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub enum DeliveryPayload {
    Credentials { username: String, password: String },
    ResetLink { username: String, link: String },
    ResetConfirmation { username: String },
    VerificationCode { username: String, code: String },
}

impl fmt::Debug for DeliveryPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryPayload::Credentials { username, .. } => f
                .debug_struct("Credentials")
                .field("username", username)
                .field("password", &"[redacted]")
                .finish(),
            DeliveryPayload::ResetLink { username, .. } => f
                .debug_struct("ResetLink")
                .field("username", username)
                .field("link", &"[redacted]")
                .finish(),
            DeliveryPayload::ResetConfirmation { username } => f
                .debug_struct("ResetConfirmation")
                .field("username", username)
                .finish(),
            DeliveryPayload::VerificationCode { username, .. } => f
                .debug_struct("VerificationCode")
                .field("username", username)
                .field("code", &"[redacted]")
                .finish(),
        }
    }
}

/// Request to send a message to an account holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRequest {
    pub recipient: String,
    pub payload: DeliveryPayload,
}

impl DeliveryRequest {
    pub fn new(recipient: impl Into<String>, payload: DeliveryPayload) -> Self {
        Self {
            recipient: recipient.into(),
            payload,
        }
    }

    pub fn kind(&self) -> DeliveryKind {
        match self.payload {
            DeliveryPayload::Credentials { .. } => DeliveryKind::Credentials,
            DeliveryPayload::ResetLink { .. } => DeliveryKind::ResetLink,
            DeliveryPayload::ResetConfirmation { .. } => DeliveryKind::ResetConfirmation,
            DeliveryPayload::VerificationCode { .. } => DeliveryKind::VerificationCode,
        }
    }
}

/// A message ready for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// Turns delivery requests into plain-text messages.
#[derive(Debug, Clone)]
pub struct MessageRenderer {
    app_name: String,
}

impl MessageRenderer {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    pub fn render(&self, request: &DeliveryRequest) -> RenderedMessage {
        let app = &self.app_name;
        match &request.payload {
            DeliveryPayload::Credentials { username, password } => RenderedMessage {
                subject: format!("[{app}] Account Credentials"),
                body: format!(
                    "Hi {username},\n\n\
                     An account has been created for you.\n\n\
                     Username: {username}\n\
                     Password: {password}\n\n\
                     You will be asked to choose a new password after your first login."
                ),
            },
            DeliveryPayload::ResetLink { username, link } => RenderedMessage {
                subject: format!("[{app}] Please reset your password"),
                body: format!(
                    "Hi {username},\n\n\
                     Use the link below to reset your password. It expires in 10 minutes.\n\n\
                     {link}\n\n\
                     If you did not request a reset, you can ignore this message."
                ),
            },
            DeliveryPayload::ResetConfirmation { username } => RenderedMessage {
                subject: format!("[{app}] Password Reset Successfully"),
                body: format!(
                    "Hi {username},\n\n\
                     Your password has been reset. If this was not you, contact an administrator."
                ),
            },
            DeliveryPayload::VerificationCode { username, code } => RenderedMessage {
                subject: format!("[{app}] Verification Code"),
                body: format!(
                    "Hi {username},\n\n\
                     Your verification code is {code}. It expires in 10 minutes."
                ),
            },
        }
    }
}

/// Transport for outbound messages.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn send(&self, request: &DeliveryRequest) -> Result<()>;
}

/// Channel that only logs that a message was requested.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDeliveryChannel;

#[async_trait]
impl DeliveryChannel for LogDeliveryChannel {
    async fn send(&self, request: &DeliveryRequest) -> Result<()> {
        tracing::info!(
            kind = %request.kind(),
            recipient = %request.recipient,
            "Delivery requested"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> DeliveryRequest {
        DeliveryRequest::new(
            "alice@example.com",
            DeliveryPayload::Credentials {
                username: "alice".to_string(),
                password: "S3cret!pass".to_string(),
            },
        )
    }

    #[test]
    fn test_kind_follows_payload() {
        assert_eq!(credentials().kind(), DeliveryKind::Credentials);
        let confirm = DeliveryRequest::new(
            "a@b.com",
            DeliveryPayload::ResetConfirmation {
                username: "a".to_string(),
            },
        );
        assert_eq!(confirm.kind(), DeliveryKind::ResetConfirmation);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", credentials());
        assert!(debug.contains("alice"));
        assert!(!debug.contains("S3cret!pass"));
    }

    #[test]
    fn test_render_credentials() {
        let renderer = MessageRenderer::new("DeskSync");
        let message = renderer.render(&credentials());
        assert_eq!(message.subject, "[DeskSync] Account Credentials");
        assert!(message.body.contains("S3cret!pass"));
        assert!(message.body.contains("Username: alice"));
    }

    #[test]
    fn test_render_reset_link() {
        let renderer = MessageRenderer::new("HDBS");
        let request = DeliveryRequest::new(
            "a@b.com",
            DeliveryPayload::ResetLink {
                username: "a".to_string(),
                link: "https://example.com/reset-password/abc/1".to_string(),
            },
        );
        let message = renderer.render(&request);
        assert_eq!(message.subject, "[HDBS] Please reset your password");
        assert!(message.body.contains("https://example.com/reset-password/abc/1"));
    }

    #[tokio::test]
    async fn test_log_channel_succeeds() {
        assert!(LogDeliveryChannel.send(&credentials()).await.is_ok());
    }
}
