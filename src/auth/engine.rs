//! Authorization engine.
//!
//! Composes password handling, reset grants, session tokens and the role
//! policy into the account operations exposed to callers. Every mutating
//! operation returns an [`Outcome`] whose effects include exactly one audit
//! event, success or failure, plus any delivery requests.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::error::AuthError;
use super::password::{
    generate_password, remaining_cooldown_hours, validate_strength, HashCost, PasswordError,
    PasswordHasher,
};
use super::policy::{self, AdminAction, Party};
use super::reset_token::{self, TokenStatus};
use super::session::{SessionClaims, SessionTokens};
use super::validation::{
    derive_username, normalize_email, validate_description, validate_email, validate_username,
    EmailPolicy,
};
use super::verification;
use super::view::{AccountPage, AccountView, AdminResult, SessionGrant};
use crate::audit::{ActionCategory, AuditEvent};
use crate::config::Config;
use crate::db::{Account, AccountStore, AccountUpdate, NewAccount};
use crate::delivery::{DeliveryPayload, DeliveryRequest};
use crate::effects::{Effect, Outcome};
use crate::DeskSyncError;

/// Highest numeric suffix tried when a derived username is taken.
const MAX_USERNAME_SUFFIX: u32 = 999;

/// Largest page size for account listings.
pub const MAX_PER_PAGE: u32 = 100;

/// Construction-time settings for the engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub hash_cost: HashCost,
    pub session_secret: String,
    pub session_ttl_secs: u64,
    pub allowed_email_domains: Vec<String>,
    pub reset_link_base: String,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            hash_cost: HashCost {
                memory_kib: config.auth.argon2_memory_kib,
                iterations: config.auth.argon2_iterations,
                parallelism: config.auth.argon2_parallelism,
            },
            session_secret: config.auth.jwt_secret.clone(),
            session_ttl_secs: config.auth.session_expiry_secs,
            allowed_email_domains: config.auth.allowed_email_domains.clone(),
            reset_link_base: config.mail.reset_link_base.clone(),
        }
    }
}

/// Audit metadata shared by the success and failure event of one operation.
struct AuditContext {
    category: ActionCategory,
    action: &'static str,
    actor: Option<i64>,
    subject: Option<String>,
}

impl AuditContext {
    fn new(category: ActionCategory, action: &'static str) -> Self {
        Self {
            category,
            action,
            actor: None,
            subject: None,
        }
    }

    fn actor(mut self, id: i64) -> Self {
        self.actor = Some(id);
        self
    }

    fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    fn event(self, failure: Option<&AuthError>) -> AuditEvent {
        let mut event = match failure {
            None => AuditEvent::success(self.category, self.action),
            Some(e) => AuditEvent::failed(self.category, self.action, e.to_string()),
        };
        event.actor_id = self.actor;
        event.subject = self.subject;
        event
    }
}

/// Attach the audit event, and on success the deliveries, to a result.
fn conclude<T>(
    ctx: AuditContext,
    result: Result<T, AuthError>,
    deliveries: Vec<DeliveryRequest>,
) -> Outcome<T> {
    let effects = match &result {
        Ok(_) => {
            let mut effects: Vec<Effect> = deliveries.into_iter().map(Effect::Deliver).collect();
            effects.push(Effect::Audit(ctx.event(None)));
            effects
        }
        Err(e) => vec![Effect::Audit(ctx.event(Some(e)))],
    };
    Outcome::new(result, effects)
}

/// Operation performed on behalf of a bearer token holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedOperation {
    ChangePassword,
    FirstChangePassword,
    UpdateProfile,
    UpdateNotificationPreference,
    Admin { target_id: i64, action: AdminAction },
}

impl GuardedOperation {
    fn audit_context(self) -> AuditContext {
        match self {
            GuardedOperation::ChangePassword => {
                AuditContext::new(ActionCategory::ProfileManagement, "Password change")
            }
            GuardedOperation::FirstChangePassword => {
                AuditContext::new(ActionCategory::ProfileManagement, "Initial password change")
            }
            GuardedOperation::UpdateProfile => {
                AuditContext::new(ActionCategory::ProfileManagement, "Profile update")
            }
            GuardedOperation::UpdateNotificationPreference => AuditContext::new(
                ActionCategory::ProfileManagement,
                "Notification settings update",
            ),
            GuardedOperation::Admin { target_id, action } => {
                let name = match action {
                    AdminAction::Delete => "Delete account",
                    AdminAction::ChangeRole(_) => "Change account role",
                    AdminAction::Disable => "Disable account",
                    AdminAction::Enable => "Enable account",
                };
                AuditContext::new(ActionCategory::UserManagement, name)
                    .subject(target_id.to_string())
            }
        }
    }
}

fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str, AuthError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AuthError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

fn require_secret<'a>(value: &'a str, field: &'static str) -> Result<&'a str, AuthError> {
    if value.is_empty() {
        Err(AuthError::MissingField(field))
    } else {
        Ok(value)
    }
}

/// Run Argon2 work off the async executor.
async fn off_thread<F, R>(work: F) -> Result<R, AuthError>
where
    F: FnOnce() -> Result<R, PasswordError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AuthError::Internal(format!("hashing task failed: {e}")))?
        .map_err(AuthError::from)
}

/// Account security and authorization engine.
pub struct AuthorizationEngine {
    store: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
    sessions: SessionTokens,
    email_policy: EmailPolicy,
    reset_link_base: String,
    /// Hash checked when no stored credential exists, so login costs the same
    /// whether or not the account does.
    decoy_hash: String,
}

impl AuthorizationEngine {
    /// Build an engine. Fails on an unusable hashing cost or a missing signing secret.
    pub fn new(store: Arc<dyn AccountStore>, settings: EngineSettings) -> crate::Result<Self> {
        let hasher = PasswordHasher::new(settings.hash_cost)
            .map_err(|e| DeskSyncError::Config(e.to_string()))?;
        let sessions = SessionTokens::new(&settings.session_secret, settings.session_ttl_secs)
            .map_err(|e| DeskSyncError::Config(e.to_string()))?;
        let decoy_hash = hasher
            .hash(&generate_password())
            .map_err(|e| DeskSyncError::Config(e.to_string()))?;

        Ok(Self {
            store,
            hasher,
            sessions,
            email_policy: EmailPolicy::new(&settings.allowed_email_domains),
            reset_link_base: settings.reset_link_base.trim_end_matches('/').to_string(),
            decoy_hash,
        })
    }

    /// The session token service.
    pub fn sessions(&self) -> &SessionTokens {
        &self.sessions
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        off_thread(move || hasher.hash(&password)).await
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let hash = hash.to_string();
        off_thread(move || hasher.verify(&password, &hash)).await
    }

    /// Re-read the acting account so decisions use its current state.
    async fn live_actor(&self, id: i64) -> Result<Account, AuthError> {
        let account = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        if account.is_disabled {
            return Err(AuthError::AccountSuspended);
        }
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        Ok(self.store.find_by_email(&normalize_email(email)).await?)
    }

    async fn save(&self, id: i64, update: AccountUpdate) -> Result<Account, AuthError> {
        self.store
            .update(id, &update)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    // ----- session -----

    /// Resolve the actor behind a bearer token.
    ///
    /// Any token problem is reported as `Unauthorized`. A disabled account is
    /// rejected here even though its token is still cryptographically valid.
    pub async fn resolve_actor(&self, token: &str) -> Result<Account, AuthError> {
        let claims = self.verify_token(token)?;
        self.live_actor(claims.sub).await
    }

    fn verify_token(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.sessions.verify(token).map_err(|e| {
            debug!(error = %e, "Session token rejected");
            AuthError::Unauthorized
        })
    }

    /// Resolve the actor for a mutating operation.
    ///
    /// A refusal (missing or bad token, deleted or suspended account) carries
    /// a failed audit event under the operation's name. Admission itself is
    /// not audited; the operation records its own event.
    pub async fn admit(
        &self,
        token: Option<&str>,
        operation: GuardedOperation,
    ) -> Outcome<Account> {
        let mut ctx = operation.audit_context();
        let result = match token.map(|t| self.verify_token(t)) {
            None => Err(AuthError::Unauthorized),
            Some(Err(e)) => Err(e),
            Some(Ok(claims)) => {
                ctx = ctx.actor(claims.sub);
                self.live_actor(claims.sub).await
            }
        };
        match result {
            Ok(account) => Outcome::new(Ok(account), Vec::new()),
            Err(e) => conclude(ctx, Err(e), Vec::new()),
        }
    }

    // ----- registration and login -----

    /// Create an account for `email` with a generated password.
    pub async fn register(&self, email: &str) -> Outcome<AccountView> {
        let ctx = AuditContext::new(ActionCategory::Registration, "Registration attempt")
            .subject(email.trim());
        let mut deliveries = Vec::new();
        let result = self.register_inner(email, &mut deliveries).await;
        conclude(ctx, result, deliveries)
    }

    async fn register_inner(
        &self,
        email: &str,
        deliveries: &mut Vec<DeliveryRequest>,
    ) -> Result<AccountView, AuthError> {
        let email = normalize_email(require(email, "email")?);
        validate_email(&email)?;

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateAccount);
        }
        if !self.email_policy.is_allowed(&email) {
            return Err(AuthError::EmailNotAllowed);
        }

        let username = self.unique_username(&derive_username(&email)).await?;
        let password = generate_password();
        let hash = self.hash_password(&password).await?;

        let account = self
            .store
            .create(&NewAccount::new(&username, &email, hash))
            .await?;

        info!(username = %account.username, account_id = account.id, "New account registered");

        deliveries.push(DeliveryRequest::new(
            &account.email,
            DeliveryPayload::Credentials {
                username: account.username.clone(),
                password,
            },
        ));
        Ok(AccountView::from(&account))
    }

    async fn unique_username(&self, base: &str) -> Result<String, AuthError> {
        if self.store.find_by_username(base).await?.is_none() {
            return Ok(base.to_string());
        }
        for n in 2..=MAX_USERNAME_SUFFIX {
            let candidate = format!("{base}{n}");
            if self.store.find_by_username(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
        Err(AuthError::DuplicateAccount)
    }

    /// Log in with an email or username and a password.
    ///
    /// A missing account and a wrong password produce the same error.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> Outcome<SessionGrant> {
        let mut ctx =
            AuditContext::new(ActionCategory::Login, "Login attempt").subject(identifier.trim());
        let result = self.authenticate_inner(identifier, password).await;
        if let Ok(grant) = &result {
            ctx = ctx.actor(grant.account.id);
        }
        conclude(ctx, result, Vec::new())
    }

    async fn authenticate_inner(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<SessionGrant, AuthError> {
        let identifier = require(identifier, "identifier")?;
        let password = require_secret(password, "password")?;

        let account = if identifier.contains('@') {
            self.find_by_email(identifier).await?
        } else {
            self.store.find_by_username(identifier).await?
        };
        let stored = account
            .as_ref()
            .and_then(|a| a.password_hash.as_deref())
            .unwrap_or(self.decoy_hash.as_str());
        let verified = self.verify_password(password, stored).await?;
        let Some(account) = account.filter(|a| verified && a.password_hash.is_some()) else {
            return Err(AuthError::InvalidCredentials);
        };
        if account.is_disabled {
            return Err(AuthError::AccountSuspended);
        }

        let token = self.sessions.issue(account.id, account.role)?;
        info!(account_id = account.id, "Login succeeded");

        Ok(SessionGrant {
            token,
            expires_in: self.sessions.ttl().num_seconds(),
            account: AccountView::from(&account),
        })
    }

    // ----- self-service credentials -----

    /// Rotate the actor's password after checking the current one.
    pub async fn change_password(
        &self,
        actor: &Account,
        current: &str,
        next: &str,
        confirm: &str,
    ) -> Outcome<AccountView> {
        let ctx = GuardedOperation::ChangePassword
            .audit_context()
            .actor(actor.id)
            .subject(&actor.email);
        let result = self.change_password_inner(actor.id, current, next, confirm).await;
        conclude(ctx, result, Vec::new())
    }

    async fn change_password_inner(
        &self,
        actor_id: i64,
        current: &str,
        next: &str,
        confirm: &str,
    ) -> Result<AccountView, AuthError> {
        let current = require_secret(current, "current_password")?;
        let next = require_secret(next, "new_password")?;
        let confirm = require_secret(confirm, "confirm_password")?;

        let account = self.live_actor(actor_id).await?;
        let Some(hash) = account.password_hash.as_deref() else {
            return Err(AuthError::IncorrectCurrentPassword);
        };
        if !self.verify_password(current, hash).await? {
            return Err(AuthError::IncorrectCurrentPassword);
        }

        let now = Utc::now();
        if let Some(remaining_hours) = remaining_cooldown_hours(account.password_changed_at, now) {
            return Err(AuthError::CooldownActive { remaining_hours });
        }
        if next != confirm {
            return Err(AuthError::PasswordMismatch);
        }
        if !validate_strength(next) {
            return Err(AuthError::WeakPassword);
        }

        let hash = self.hash_password(next).await?;
        let updated = self
            .save(account.id, AccountUpdate::new().password(hash, now))
            .await?;
        info!(account_id = updated.id, "Password changed");
        Ok(AccountView::from(&updated))
    }

    /// Replace the generated password on first login.
    ///
    /// Only allowed while the account has never rotated its password. No
    /// current password and no cooldown apply.
    pub async fn first_change_password(
        &self,
        actor: &Account,
        next: &str,
        confirm: &str,
    ) -> Outcome<AccountView> {
        let ctx = GuardedOperation::FirstChangePassword
            .audit_context()
            .actor(actor.id)
            .subject(&actor.email);
        let result = self.first_change_password_inner(actor.id, next, confirm).await;
        conclude(ctx, result, Vec::new())
    }

    async fn first_change_password_inner(
        &self,
        actor_id: i64,
        next: &str,
        confirm: &str,
    ) -> Result<AccountView, AuthError> {
        let next = require_secret(next, "new_password")?;
        let confirm = require_secret(confirm, "confirm_password")?;

        let account = self.live_actor(actor_id).await?;
        if !account.must_change_password() {
            return Err(AuthError::FirstLoginAlreadyCompleted);
        }
        if next != confirm {
            return Err(AuthError::PasswordMismatch);
        }
        if !validate_strength(next) {
            return Err(AuthError::WeakPassword);
        }

        let hash = self.hash_password(next).await?;
        let updated = self
            .save(account.id, AccountUpdate::new().password(hash, Utc::now()))
            .await?;
        info!(account_id = updated.id, "Initial password replaced");
        Ok(AccountView::from(&updated))
    }

    // ----- password reset -----

    /// Issue a reset grant and send the link.
    ///
    /// Unlike [`Self::authenticate`], an unknown email is reported as
    /// `AccountNotFound`.
    pub async fn forgot_password(&self, email: &str) -> Outcome<()> {
        let ctx = AuditContext::new(ActionCategory::ProfileManagement, "Password reset request")
            .subject(email.trim());
        let mut deliveries = Vec::new();
        let result = self.forgot_password_inner(email, &mut deliveries).await;
        conclude(ctx, result, deliveries)
    }

    async fn forgot_password_inner(
        &self,
        email: &str,
        deliveries: &mut Vec<DeliveryRequest>,
    ) -> Result<(), AuthError> {
        let email = require(email, "email")?;
        let account = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        let issued = reset_token::issue(Utc::now());
        self.save(account.id, AccountUpdate::new().reset_token(Some(issued.record)))
            .await?;

        let link = format!("{}/{}/{}", self.reset_link_base, issued.secret, account.id);
        info!(account_id = account.id, "Password reset link issued");

        deliveries.push(DeliveryRequest::new(
            &account.email,
            DeliveryPayload::ResetLink {
                username: account.username.clone(),
                link,
            },
        ));
        Ok(())
    }

    /// Check a reset secret without consuming it.
    pub async fn validate_reset_token(&self, account_id: i64, secret: &str) -> Result<(), AuthError> {
        let account = self
            .store
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;
        match reset_token::validate(account.reset_token.as_ref(), secret, Utc::now()) {
            TokenStatus::Valid => Ok(()),
            TokenStatus::Invalid => Err(AuthError::InvalidResetToken),
            TokenStatus::Expired => Err(AuthError::ResetTokenExpired),
        }
    }

    /// Set a new password using a reset grant, consuming the grant.
    pub async fn reset_password(
        &self,
        account_id: i64,
        secret: &str,
        next: &str,
        confirm: &str,
    ) -> Outcome<()> {
        let ctx = AuditContext::new(ActionCategory::ProfileManagement, "Password reset")
            .subject(account_id.to_string());
        let mut deliveries = Vec::new();
        let result = self
            .reset_password_inner(account_id, secret, next, confirm, &mut deliveries)
            .await;
        conclude(ctx, result, deliveries)
    }

    async fn reset_password_inner(
        &self,
        account_id: i64,
        secret: &str,
        next: &str,
        confirm: &str,
        deliveries: &mut Vec<DeliveryRequest>,
    ) -> Result<(), AuthError> {
        let next = require_secret(next, "new_password")?;
        let confirm = require_secret(confirm, "confirm_password")?;

        let account = self
            .store
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        let now = Utc::now();
        let stored = account.reset_token.as_ref();
        match reset_token::validate(stored, secret, now) {
            TokenStatus::Valid => {}
            TokenStatus::Invalid => return Err(AuthError::InvalidResetToken),
            TokenStatus::Expired => return Err(AuthError::ResetTokenExpired),
        }
        let Some(stored_hash) = stored.map(|t| t.token_hash.clone()) else {
            return Err(AuthError::InvalidResetToken);
        };

        if next != confirm {
            return Err(AuthError::PasswordMismatch);
        }
        if let Some(remaining_hours) = remaining_cooldown_hours(account.password_changed_at, now) {
            return Err(AuthError::CooldownActive { remaining_hours });
        }
        if !validate_strength(next) {
            return Err(AuthError::WeakPassword);
        }

        let hash = self.hash_password(next).await?;
        // Conditional on the grant we validated, so it can only be spent once
        if !self
            .store
            .complete_reset(account.id, &stored_hash, &hash, now)
            .await?
        {
            return Err(AuthError::InvalidResetToken);
        }

        info!(account_id = account.id, "Password reset completed");
        deliveries.push(DeliveryRequest::new(
            &account.email,
            DeliveryPayload::ResetConfirmation {
                username: account.username.clone(),
            },
        ));
        Ok(())
    }

    // ----- administration -----

    /// Delete, re-role, disable or enable another account.
    pub async fn admin_set_account_state(
        &self,
        actor: &Account,
        target_id: i64,
        action: AdminAction,
    ) -> Outcome<AdminResult> {
        let ctx = GuardedOperation::Admin { target_id, action }
            .audit_context()
            .actor(actor.id);
        let result = self.admin_inner(actor.id, target_id, action).await;
        conclude(ctx, result, Vec::new())
    }

    async fn admin_inner(
        &self,
        actor_id: i64,
        target_id: i64,
        action: AdminAction,
    ) -> Result<AdminResult, AuthError> {
        let actor = self.live_actor(actor_id).await?;
        let target = self
            .store
            .find_by_id(target_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        policy::authorize_on(
            Party::new(actor.id, actor.role),
            Party::new(target.id, target.role),
            action,
        )?;

        let update = match action {
            AdminAction::Delete => {
                if !self.store.delete(target.id).await? {
                    return Err(AuthError::AccountNotFound);
                }
                info!(actor_id = actor.id, target_id = target.id, "Account deleted");
                return Ok(AdminResult::Deleted { id: target.id });
            }
            AdminAction::ChangeRole(role) => AccountUpdate::new().role(role),
            AdminAction::Disable | AdminAction::Enable => {
                let disabled = policy::next_disabled_state(target.is_disabled, action)?;
                AccountUpdate::new().is_disabled(disabled)
            }
        };

        let updated = self.save(target.id, update).await?;
        info!(
            actor_id = actor.id,
            target_id = updated.id,
            action = %action,
            "Account updated by administrator"
        );
        Ok(AdminResult::Updated {
            account: AccountView::from(&updated),
        })
    }

    /// Page through all accounts. Administrators only.
    pub async fn list_accounts(
        &self,
        actor: &Account,
        page: u32,
        per_page: u32,
    ) -> Result<AccountPage, AuthError> {
        let actor = self.live_actor(actor.id).await?;
        policy::require_administrator(actor.role)?;

        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        let offset = i64::from(page - 1) * i64::from(per_page);

        let accounts = self.store.list(offset, i64::from(per_page)).await?;
        let total = self.store.count().await?;

        Ok(AccountPage {
            accounts: accounts.iter().map(AccountView::from).collect(),
            total,
            page,
            per_page,
        })
    }

    // ----- profile -----

    /// Current state of the actor's account.
    pub async fn current_account(&self, actor: &Account) -> Result<AccountView, AuthError> {
        let account = self.live_actor(actor.id).await?;
        Ok(AccountView::from(&account))
    }

    /// Change the actor's username and/or description.
    pub async fn update_profile(
        &self,
        actor: &Account,
        username: Option<&str>,
        description: Option<&str>,
    ) -> Outcome<AccountView> {
        let ctx = GuardedOperation::UpdateProfile
            .audit_context()
            .actor(actor.id)
            .subject(&actor.email);
        let result = self.update_profile_inner(actor.id, username, description).await;
        conclude(ctx, result, Vec::new())
    }

    async fn update_profile_inner(
        &self,
        actor_id: i64,
        username: Option<&str>,
        description: Option<&str>,
    ) -> Result<AccountView, AuthError> {
        if username.is_none() && description.is_none() {
            return Err(AuthError::MissingField("username or description"));
        }

        let account = self.live_actor(actor_id).await?;
        let mut update = AccountUpdate::new();

        // Derived usernames may carry characters a chosen one may not
        if let Some(username) = username.map(str::trim) {
            if username != account.username {
                validate_username(username)?;
                if self.store.find_by_username(username).await?.is_some() {
                    return Err(AuthError::DuplicateAccount);
                }
                update = update.username(username);
            }
        }
        if let Some(description) = description.map(str::trim) {
            validate_description(description)?;
            let description = (!description.is_empty()).then(|| description.to_string());
            update = update.description(description);
        }

        let updated = self.save(account.id, update).await?;
        Ok(AccountView::from(&updated))
    }

    /// Turn notification emails on or off for the actor.
    pub async fn update_notification_preference(
        &self,
        actor: &Account,
        receiving_email: bool,
    ) -> Outcome<AccountView> {
        let ctx = GuardedOperation::UpdateNotificationPreference
            .audit_context()
            .actor(actor.id)
            .subject(&actor.email);
        let result = self.notification_inner(actor.id, receiving_email).await;
        conclude(ctx, result, Vec::new())
    }

    async fn notification_inner(
        &self,
        actor_id: i64,
        receiving_email: bool,
    ) -> Result<AccountView, AuthError> {
        let account = self.live_actor(actor_id).await?;
        let updated = self
            .save(account.id, AccountUpdate::new().receiving_email(receiving_email))
            .await?;
        Ok(AccountView::from(&updated))
    }

    // ----- device verification -----

    /// Send a one-time code for confirming a new device.
    pub async fn request_device_verification(&self, email: &str) -> Outcome<()> {
        let ctx = AuditContext::new(ActionCategory::Login, "Verification code request")
            .subject(email.trim());
        let mut deliveries = Vec::new();
        let result = self.request_verification_inner(email, &mut deliveries).await;
        conclude(ctx, result, deliveries)
    }

    async fn request_verification_inner(
        &self,
        email: &str,
        deliveries: &mut Vec<DeliveryRequest>,
    ) -> Result<(), AuthError> {
        let email = require(email, "email")?;
        let account = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;
        if account.is_disabled {
            return Err(AuthError::AccountSuspended);
        }

        let code = verification::generate_code();
        let hasher = self.hasher.clone();
        let code_for_hash = code.clone();
        let now = Utc::now();
        let record =
            off_thread(move || verification::record_for(&hasher, &code_for_hash, now)).await?;
        self.save(account.id, AccountUpdate::new().verification(Some(record)))
            .await?;

        deliveries.push(DeliveryRequest::new(
            &account.email,
            DeliveryPayload::VerificationCode {
                username: account.username.clone(),
                code,
            },
        ));
        Ok(())
    }

    /// Check a device verification code, consuming it on success.
    pub async fn confirm_device_verification(&self, email: &str, code: &str) -> Outcome<()> {
        let ctx = AuditContext::new(ActionCategory::Login, "Device verification")
            .subject(email.trim());
        let result = self.confirm_verification_inner(email, code).await;
        conclude(ctx, result, Vec::new())
    }

    async fn confirm_verification_inner(&self, email: &str, code: &str) -> Result<(), AuthError> {
        let email = require(email, "email")?;
        let code = require(code, "code")?.to_string();
        let account = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        let hasher = self.hasher.clone();
        let stored = account.verification.clone();
        let status = off_thread(move || {
            verification::check(&hasher, stored.as_ref(), &code, Utc::now())
        })
        .await?;

        match status {
            TokenStatus::Valid => {}
            TokenStatus::Invalid => return Err(AuthError::InvalidVerificationCode),
            TokenStatus::Expired => return Err(AuthError::VerificationCodeExpired),
        }

        self.save(account.id, AccountUpdate::new().verification(None))
            .await?;
        info!(account_id = account.id, "Device verified");
        Ok(())
    }
}
