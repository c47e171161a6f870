//! Outbox of rendered messages.
//!
//! The delivery channel used by the server stores each message here; a
//! separate mailer process picks up rows with `sent_at IS NULL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::delivery::{DeliveryChannel, DeliveryRequest, MessageRenderer};
use crate::Result;

/// Message waiting in the outbox.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OutboxMessage {
    pub id: i64,
    pub kind: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Repository for the outbox table.
pub struct OutboxRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OutboxRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn enqueue(&self, kind: &str, recipient: &str, subject: &str, body: &str) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO outbox (kind, recipient, subject, body, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(kind)
        .bind(recipient)
        .bind(subject)
        .bind(body)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Messages not yet handed to transport, oldest first.
    pub async fn list_pending(&self) -> Result<Vec<OutboxMessage>> {
        let messages = sqlx::query_as::<_, OutboxMessage>(
            "SELECT id, kind, recipient, subject, body, created_at, sent_at
             FROM outbox WHERE sent_at IS NULL ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(messages)
    }

    /// Mark a message as sent. Returns false if it was already marked.
    pub async fn mark_sent(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE outbox SET sent_at = ? WHERE id = ? AND sent_at IS NULL")
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Delivery channel that renders messages into the outbox.
#[derive(Clone)]
pub struct OutboxDeliveryChannel {
    pool: SqlitePool,
    renderer: MessageRenderer,
}

impl OutboxDeliveryChannel {
    pub fn new(pool: SqlitePool, renderer: MessageRenderer) -> Self {
        Self { pool, renderer }
    }
}

#[async_trait]
impl DeliveryChannel for OutboxDeliveryChannel {
    async fn send(&self, request: &DeliveryRequest) -> Result<()> {
        let message = self.renderer.render(request);
        let id = OutboxRepository::new(&self.pool)
            .enqueue(
                request.kind().as_str(),
                &request.recipient,
                &message.subject,
                &message.body,
            )
            .await?;

        tracing::debug!(outbox_id = id, kind = %request.kind(), "Message queued");
        Ok(())
    }
}
