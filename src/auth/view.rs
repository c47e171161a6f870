//! Public views of account data.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{Account, Role};

/// Account fields safe to return to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_disabled: bool,
    pub description: Option<String>,
    pub receiving_email: bool,
    pub password_changed_at: Option<DateTime<Utc>>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            role: account.role,
            is_disabled: account.is_disabled,
            description: account.description.clone(),
            receiving_email: account.receiving_email,
            password_changed_at: account.password_changed_at,
        }
    }
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self::from(&account)
    }
}

/// Successful login: the bearer token plus the account it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct SessionGrant {
    pub token: String,
    pub expires_in: i64,
    pub account: AccountView,
}

/// One page of the account list.
#[derive(Debug, Clone, Serialize)]
pub struct AccountPage {
    pub accounts: Vec<AccountView>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

/// What an administrative action left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdminResult {
    Deleted { id: i64 },
    Updated { account: AccountView },
}
