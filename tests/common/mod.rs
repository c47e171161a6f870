//! Shared helpers for HTTP API integration tests.
//!
//! Builds the full router over an in-memory SQLite database, with a
//! recording delivery channel so tests can read generated passwords,
//! reset links and verification codes.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use desksync::auth::{HashCost, PasswordHasher};
use desksync::db::{
    AccountStore, AccountUpdate, NewAccount, SqliteAccountStore, SqliteAuditSink,
};
use desksync::delivery::{DeliveryChannel, DeliveryPayload, DeliveryRequest};
use desksync::web::middleware::RateLimitState;
use desksync::web::{create_router, AppState};
use desksync::{
    Account, AuthorizationEngine, Database, DeskSyncError, EffectExecutor, EngineSettings, Role,
};

/// Password every seeded account starts with.
pub const SEED_PASSWORD: &str = "Abc123!@#x";

pub const TEST_COST: HashCost = HashCost {
    memory_kib: 1024,
    iterations: 1,
    parallelism: 1,
};

/// Delivery channel that keeps every request and can be told to fail.
#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<DeliveryRequest>>,
    failing: AtomicBool,
}

impl RecordingChannel {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<DeliveryRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> DeliveryRequest {
        self.sent().pop().expect("nothing delivered")
    }

    /// Generated password from the latest credentials message.
    pub fn last_password(&self) -> String {
        match self.last().payload {
            DeliveryPayload::Credentials { password, .. } => password,
            other => panic!("expected credentials, got {other:?}"),
        }
    }

    /// `(secret, account id)` from the latest reset link.
    pub fn last_reset_link(&self) -> (String, i64) {
        match self.last().payload {
            DeliveryPayload::ResetLink { link, .. } => {
                let mut parts = link.rsplit('/');
                let id = parts.next().unwrap().parse().unwrap();
                let secret = parts.next().unwrap().to_string();
                (secret, id)
            }
            other => panic!("expected reset link, got {other:?}"),
        }
    }

    pub fn last_code(&self) -> String {
        match self.last().payload {
            DeliveryPayload::VerificationCode { code, .. } => code,
            other => panic!("expected verification code, got {other:?}"),
        }
    }
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    async fn send(&self, request: &DeliveryRequest) -> desksync::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeskSyncError::Delivery("mail relay unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(request.clone());
        Ok(())
    }
}

/// A running test application.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub store: Arc<SqliteAccountStore>,
    pub mail: Arc<RecordingChannel>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_login_limit(100).await
    }

    pub async fn with_login_limit(limit: u32) -> Self {
        let db = Database::open_in_memory()
            .await
            .expect("Failed to create test database");
        let store = Arc::new(SqliteAccountStore::new(db.pool().clone()));
        let mail = Arc::new(RecordingChannel::default());

        let engine = AuthorizationEngine::new(
            store.clone(),
            EngineSettings {
                hash_cost: TEST_COST,
                session_secret: "test-secret-key-for-testing-only".to_string(),
                session_ttl_secs: 900,
                allowed_email_domains: vec![],
                reset_link_base: "http://localhost:5173/reset-password".to_string(),
            },
        )
        .expect("Failed to create engine");
        let effects = EffectExecutor::new(
            Arc::new(SqliteAuditSink::new(db.pool().clone())),
            mail.clone(),
        );

        let router = create_router(
            Arc::new(AppState::new(Arc::new(engine), effects)),
            Arc::new(RateLimitState::new(limit, 900)),
            &[],
        );
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            db,
            store,
            mail,
        }
    }

    /// Insert an account with [`SEED_PASSWORD`] directly into the store.
    pub async fn seed(
        &self,
        username: &str,
        role: Role,
        password_changed_at: Option<DateTime<Utc>>,
    ) -> Account {
        let hash = PasswordHasher::new(TEST_COST)
            .unwrap()
            .hash(SEED_PASSWORD)
            .unwrap();
        let account = self
            .store
            .create(
                &NewAccount::new(username, format!("{username}@example.com"), hash).with_role(role),
            )
            .await
            .unwrap();

        let mut update = AccountUpdate::new();
        update.password_changed_at = Some(password_changed_at);
        self.store.update(account.id, &update).await.unwrap().unwrap()
    }

    /// Log in and return the bearer token.
    pub async fn login(&self, identifier: &str, password: &str) -> String {
        let response = self
            .server
            .post("/api/auth/login")
            .json(&json!({ "identifier": identifier, "password": password }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["data"]["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Seed an account and log it in.
    pub async fn seed_and_login(&self, username: &str, role: Role) -> (Account, String) {
        let account = self.seed(username, role, None).await;
        let token = self.login(username, SEED_PASSWORD).await;
        (account, token)
    }

    pub fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }
}
