//! Audit events produced by the authorization engine.
//!
//! The engine only builds [`AuditEvent`] values. Persisting them is the job
//! of an [`AuditSink`]; see [`crate::db::SqliteAuditSink`] and
//! [`TracingAuditSink`].

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::Result;

/// Area of the system an audited action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Registration,
    Login,
    ProfileManagement,
    UserManagement,
}

impl ActionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionCategory::Registration => "registration",
            ActionCategory::Login => "login",
            ActionCategory::ProfileManagement => "profile_management",
            ActionCategory::UserManagement => "user_management",
        }
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the audited action went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    Failed,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Failed => "failed",
        }
    }
}

/// A single audit record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    /// Acting account, or `None` for anonymous callers.
    pub actor_id: Option<i64>,
    pub category: ActionCategory,
    /// Short description of what was attempted.
    pub action: String,
    /// Attempted identifier or target account, when there is one.
    pub subject: Option<String>,
    pub outcome: AuditOutcome,
    /// Human-readable context, e.g. the failure reason.
    pub detail: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    fn new(category: ActionCategory, action: impl Into<String>, outcome: AuditOutcome) -> Self {
        Self {
            actor_id: None,
            category,
            action: action.into(),
            subject: None,
            outcome,
            detail: None,
            occurred_at: Utc::now(),
        }
    }

    /// Successful action.
    pub fn success(category: ActionCategory, action: impl Into<String>) -> Self {
        Self::new(category, action, AuditOutcome::Success)
    }

    /// Failed action with the reason in `detail`.
    pub fn failed(
        category: ActionCategory,
        action: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(category, action, AuditOutcome::Failed).with_detail(detail)
    }

    pub fn with_actor(mut self, actor_id: i64) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.outcome == AuditOutcome::Success
    }
}

/// Destination for audit events.
///
/// Recording is best effort: a failing sink never fails the operation that
/// produced the event.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: &AuditEvent) -> Result<()>;
}

/// Audit sink that writes events to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<()> {
        match event.outcome {
            AuditOutcome::Success => tracing::info!(
                target: "desksync::audit",
                actor_id = ?event.actor_id,
                category = %event.category,
                subject = ?event.subject,
                detail = ?event.detail,
                "{}",
                event.action
            ),
            AuditOutcome::Failed => tracing::warn!(
                target: "desksync::audit",
                actor_id = ?event.actor_id,
                category = %event.category,
                subject = ?event.subject,
                detail = ?event.detail,
                "{}",
                event.action
            ),
        }
        Ok(())
    }
}
