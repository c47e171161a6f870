//! In-memory account store.
//!
//! Used by unit tests and local tooling where a SQLite file is unnecessary.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::account::{Account, AccountUpdate, NewAccount};
use super::store::AccountStore;
use crate::{DeskSyncError, Result};

#[derive(Default)]
struct Inner {
    accounts: BTreeMap<i64, Account>,
    next_id: i64,
}

/// Account store held in process memory.
#[derive(Default)]
pub struct MemoryAccountStore {
    inner: RwLock<Inner>,
}

impl MemoryAccountStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn conflict(inner: &Inner, id: Option<i64>, username: &str, email: Option<&str>) -> Option<String> {
    inner
        .accounts
        .values()
        .filter(|a| Some(a.id) != id)
        .find_map(|a| {
            if a.username == username {
                Some(format!("username {username} already exists"))
            } else if email.is_some_and(|e| a.email == e) {
                Some(format!("email {} already exists", a.email))
            } else {
                None
            }
        })
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        Ok(self.inner.read().await.accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.values().find(|a| a.username == username).cloned())
    }

    async fn create(&self, new_account: &NewAccount) -> Result<Account> {
        let mut inner = self.inner.write().await;
        if let Some(msg) = conflict(
            &inner,
            None,
            &new_account.username,
            Some(&new_account.email),
        ) {
            return Err(DeskSyncError::Conflict(msg));
        }

        inner.next_id += 1;
        let account = Account {
            id: inner.next_id,
            username: new_account.username.clone(),
            email: new_account.email.clone(),
            password_hash: Some(new_account.password_hash.clone()),
            role: new_account.role,
            is_disabled: false,
            description: None,
            receiving_email: true,
            password_changed_at: None,
            reset_token: None,
            verification: None,
            created_at: Utc::now(),
        };
        inner.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update(&self, id: i64, update: &AccountUpdate) -> Result<Option<Account>> {
        let mut inner = self.inner.write().await;
        if let Some(username) = &update.username {
            if let Some(msg) = conflict(&inner, Some(id), username, None) {
                return Err(DeskSyncError::Conflict(msg));
            }
        }

        Ok(inner.accounts.get_mut(&id).map(|account| {
            update.apply_to(account);
            account.clone()
        }))
    }

    async fn complete_reset(
        &self,
        id: i64,
        token_hash: &str,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(account) = inner.accounts.get_mut(&id) else {
            return Ok(false);
        };
        let matches = account
            .reset_token
            .as_ref()
            .is_some_and(|t| t.token_hash == token_hash);
        if !matches {
            return Ok(false);
        }

        AccountUpdate::new()
            .password(password_hash, changed_at)
            .reset_token(None)
            .apply_to(account);
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.inner.write().await.accounts.remove(&id).is_some())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.inner.read().await.accounts.len() as i64)
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Account>> {
        let inner = self.inner.read().await;
        Ok(inner
            .accounts
            .values()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Role;

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemoryAccountStore::new();
        let account = store
            .create(&NewAccount::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();

        assert_eq!(account.id, 1);
        assert_eq!(account.role, Role::User);
        assert!(store.find_by_username("alice").await.unwrap().is_some());
        assert!(store.find_by_email("alice@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let store = MemoryAccountStore::new();
        store
            .create(&NewAccount::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();

        let dup_email = store
            .create(&NewAccount::new("other", "alice@example.com", "hash"))
            .await;
        let dup_name = store
            .create(&NewAccount::new("alice", "other@example.com", "hash"))
            .await;
        assert!(matches!(dup_email, Err(DeskSyncError::Conflict(_))));
        assert!(matches!(dup_name, Err(DeskSyncError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_rename_to_taken_username_rejected() {
        let store = MemoryAccountStore::new();
        store
            .create(&NewAccount::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();
        let bob = store
            .create(&NewAccount::new("bob", "bob@example.com", "hash"))
            .await
            .unwrap();

        let result = store
            .update(bob.id, &AccountUpdate::new().username("alice"))
            .await;
        assert!(matches!(result, Err(DeskSyncError::Conflict(_))));

        // Keeping one's own name is not a conflict
        let result = store
            .update(bob.id, &AccountUpdate::new().username("bob"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_delete_and_count() {
        let store = MemoryAccountStore::new();
        let account = store
            .create(&NewAccount::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.delete(account.id).await.unwrap());
        assert!(!store.delete(account.id).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
