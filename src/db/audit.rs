//! Audit event persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::audit::{AuditEvent, AuditSink};
use crate::Result;

/// Audit event as read back from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredAuditEvent {
    pub id: i64,
    pub actor_id: Option<i64>,
    pub category: String,
    pub action: String,
    pub subject: Option<String>,
    pub outcome: String,
    pub detail: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Repository for audit events.
pub struct AuditRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AuditRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an event and return its row ID.
    pub async fn insert(&self, event: &AuditEvent) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO audit_events (actor_id, category, action, subject, outcome, detail, occurred_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(event.actor_id)
        .bind(event.category.as_str())
        .bind(&event.action)
        .bind(&event.subject)
        .bind(event.outcome.as_str())
        .bind(&event.detail)
        .bind(event.occurred_at)
        .execute(self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Most recent events first.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<StoredAuditEvent>> {
        let events = sqlx::query_as::<_, StoredAuditEvent>(
            "SELECT id, actor_id, category, action, subject, outcome, detail, occurred_at
             FROM audit_events ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(events)
    }
}

/// Audit sink writing to the `audit_events` table.
#[derive(Clone)]
pub struct SqliteAuditSink {
    pool: SqlitePool,
}

impl SqliteAuditSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<()> {
        AuditRepository::new(&self.pool).insert(event).await?;
        Ok(())
    }
}
