//! Account store abstraction and its SQLite implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, SqlitePool};

use super::account::{Account, AccountUpdate, NewAccount};
use crate::{DeskSyncError, Result};

const ACCOUNT_COLUMNS: &str = "id, username, email, password_hash, role, is_disabled, description,
     receiving_email, password_changed_at, reset_token_hash, reset_token_expires_at,
     verification_code_hash, verification_expires_at, created_at";

/// Persistent storage for accounts.
///
/// Every read returns the current persisted state; implementations must not
/// cache records between calls.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Get an account by ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Account>>;

    /// Get an account by email (exact match on the normalized address).
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Get an account by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>>;

    /// Insert a new account. Fails with `Conflict` on a duplicate username or email.
    async fn create(&self, new_account: &NewAccount) -> Result<Account>;

    /// Apply a partial update. Returns `None` if the account does not exist.
    async fn update(&self, id: i64, update: &AccountUpdate) -> Result<Option<Account>>;

    /// Replace the credential and clear the reset grant, but only while the
    /// stored grant still has `token_hash`.
    ///
    /// Returns false if the grant was consumed or replaced in the meantime.
    async fn complete_reset(
        &self,
        id: i64,
        token_hash: &str,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Delete an account and its reservations. Returns false if not found.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Count all accounts.
    async fn count(&self) -> Result<i64>;

    /// List accounts ordered by ID.
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Account>>;
}

/// SQLite-backed account store.
#[derive(Clone)]
pub struct SqliteAccountStore {
    pool: SqlitePool,
}

impl SqliteAccountStore {
    /// Create a store over the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {column} = ?");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.find_one("email", email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.find_one("username", username).await
    }

    async fn create(&self, new_account: &NewAccount) -> Result<Account> {
        let result = sqlx::query(
            "INSERT INTO accounts (username, email, password_hash, role, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new_account.username)
        .bind(&new_account.email)
        .bind(&new_account.password_hash)
        .bind(new_account.role.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DeskSyncError::NotFound("account".to_string()))
    }

    async fn update(&self, id: i64, update: &AccountUpdate) -> Result<Option<Account>> {
        if update.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE accounts SET ");
        let mut separated = query.separated(", ");

        if let Some(ref username) = update.username {
            separated.push("username = ");
            separated.push_bind_unseparated(username.clone());
        }
        if let Some(ref description) = update.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description.clone());
        }
        if let Some(ref password_hash) = update.password_hash {
            separated.push("password_hash = ");
            separated.push_bind_unseparated(password_hash.clone());
        }
        if let Some(changed_at) = update.password_changed_at {
            separated.push("password_changed_at = ");
            separated.push_bind_unseparated(changed_at);
        }
        if let Some(role) = update.role {
            separated.push("role = ");
            separated.push_bind_unseparated(role.as_str());
        }
        if let Some(is_disabled) = update.is_disabled {
            separated.push("is_disabled = ");
            separated.push_bind_unseparated(is_disabled);
        }
        if let Some(receiving_email) = update.receiving_email {
            separated.push("receiving_email = ");
            separated.push_bind_unseparated(receiving_email);
        }
        if let Some(ref token) = update.reset_token {
            separated.push("reset_token_hash = ");
            separated.push_bind_unseparated(token.as_ref().map(|t| t.token_hash.clone()));
            separated.push("reset_token_expires_at = ");
            separated.push_bind_unseparated(token.as_ref().map(|t| t.expires_at));
        }
        if let Some(ref verification) = update.verification {
            separated.push("verification_code_hash = ");
            separated.push_bind_unseparated(verification.as_ref().map(|v| v.code_hash.clone()));
            separated.push("verification_expires_at = ");
            separated.push_bind_unseparated(verification.as_ref().map(|v| v.expires_at));
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query.build().execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    async fn complete_reset(
        &self,
        id: i64,
        token_hash: &str,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE accounts
             SET password_hash = ?,
                 password_changed_at = ?,
                 reset_token_hash = NULL,
                 reset_token_expires_at = NULL
             WHERE id = ? AND reset_token_hash = ?",
        )
        .bind(password_hash)
        .bind(changed_at)
        .bind(id)
        .bind(token_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id LIMIT ? OFFSET ?");
        let accounts = sqlx::query_as::<_, Account>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, ResetTokenRecord, Role};
    use chrono::Duration;

    async fn setup_store() -> (Database, SqliteAccountStore) {
        let db = Database::open_in_memory().await.unwrap();
        let store = SqliteAccountStore::new(db.pool().clone());
        (db, store)
    }

    #[tokio::test]
    async fn test_create_account() {
        let (_db, store) = setup_store().await;

        let account = store
            .create(&NewAccount::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();

        assert_eq!(account.id, 1);
        assert_eq!(account.username, "alice");
        assert_eq!(account.role, Role::User);
        assert!(!account.is_disabled);
        assert!(account.receiving_email);
        assert!(account.password_changed_at.is_none());
        assert!(account.reset_token.is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_email_conflicts() {
        let (_db, store) = setup_store().await;
        store
            .create(&NewAccount::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();

        let result = store
            .create(&NewAccount::new("alice2", "alice@example.com", "hash"))
            .await;
        assert!(matches!(result, Err(DeskSyncError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_find_by_email_and_username() {
        let (_db, store) = setup_store().await;
        let created = store
            .create(&NewAccount::new("bob", "bob@example.com", "hash"))
            .await
            .unwrap();

        let by_email = store.find_by_email("bob@example.com").await.unwrap().unwrap();
        let by_username = store.find_by_username("bob").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_username.id, created.id);
        assert!(store.find_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_account() {
        let (_db, store) = setup_store().await;
        let account = store
            .create(&NewAccount::new("carol", "carol@example.com", "hash"))
            .await
            .unwrap();

        let now = Utc::now();
        let update = AccountUpdate::new()
            .password("new-hash", now)
            .role(Role::Om)
            .is_disabled(true)
            .description(Some("Facilities".to_string()));
        let updated = store.update(account.id, &update).await.unwrap().unwrap();

        assert_eq!(updated.password_hash.as_deref(), Some("new-hash"));
        assert_eq!(updated.role, Role::Om);
        assert!(updated.is_disabled);
        assert_eq!(updated.description.as_deref(), Some("Facilities"));
        assert!(updated.password_changed_at.is_some());
    }

    #[tokio::test]
    async fn test_update_nonexistent() {
        let (_db, store) = setup_store().await;
        let result = store
            .update(42, &AccountUpdate::new().is_disabled(true))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_complete_reset_is_conditional() {
        let (_db, store) = setup_store().await;
        let account = store
            .create(&NewAccount::new("dave", "dave@example.com", "hash"))
            .await
            .unwrap();

        let token = ResetTokenRecord {
            token_hash: "abc123".to_string(),
            expires_at: Utc::now() + Duration::minutes(10),
        };
        store
            .update(account.id, &AccountUpdate::new().reset_token(Some(token)))
            .await
            .unwrap();

        assert!(!store
            .complete_reset(account.id, "wrong", "new-hash", Utc::now())
            .await
            .unwrap());
        assert!(store
            .complete_reset(account.id, "abc123", "new-hash", Utc::now())
            .await
            .unwrap());
        // Second consumption finds no grant
        assert!(!store
            .complete_reset(account.id, "abc123", "other-hash", Utc::now())
            .await
            .unwrap());

        let reloaded = store.find_by_id(account.id).await.unwrap().unwrap();
        assert!(reloaded.reset_token.is_none());
        assert_eq!(reloaded.password_hash.as_deref(), Some("new-hash"));
    }

    #[tokio::test]
    async fn test_delete_cascades_reservations() {
        let (db, store) = setup_store().await;
        let account = store
            .create(&NewAccount::new("erin", "erin@example.com", "hash"))
            .await
            .unwrap();

        sqlx::query(
            "INSERT INTO reservations (account_id, desk_id, starts_at, ends_at)
             VALUES (?, 7, '2026-01-01T09:00:00Z', '2026-01-01T17:00:00Z')",
        )
        .bind(account.id)
        .execute(db.pool())
        .await
        .unwrap();

        assert!(store.delete(account.id).await.unwrap());
        assert!(!store.delete(account.id).await.unwrap());

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_count_and_list() {
        let (_db, store) = setup_store().await;
        for name in ["a", "b", "c"] {
            store
                .create(&NewAccount::new(name, format!("{name}@example.com"), "hash"))
                .await
                .unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 3);
        let page = store.list(1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].username, "b");
    }
}
