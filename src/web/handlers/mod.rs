//! API handlers for the DeskSync HTTP API.

use std::sync::Arc;

use serde::Serialize;

use crate::auth::{AuthorizationEngine, GuardedOperation};
use crate::db::Account;
use crate::effects::{EffectExecutor, Outcome};
use crate::web::dto::ApiResponse;
use crate::web::error::ApiError;

pub mod account;
pub mod admin;
pub mod auth;

pub use account::*;
pub use admin::*;
pub use auth::*;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AuthorizationEngine>,
    /// Performs audit and delivery effects after each engine decision.
    pub effects: EffectExecutor,
}

impl AppState {
    pub fn new(engine: Arc<AuthorizationEngine>, effects: EffectExecutor) -> Self {
        Self { engine, effects }
    }

    /// Perform the outcome's effects and wrap the value for the response.
    pub async fn complete<T: Serialize>(
        &self,
        outcome: Outcome<T>,
    ) -> Result<ApiResponse<T>, ApiError> {
        let completion = self.effects.run(outcome).await?;
        Ok(ApiResponse::from(completion))
    }

    /// Resolve the actor for a mutating route, recording a refusal.
    pub async fn admit(
        &self,
        token: Option<&str>,
        operation: GuardedOperation,
    ) -> Result<Account, ApiError> {
        let outcome = self.engine.admit(token, operation).await;
        Ok(self.effects.run(outcome).await?.value)
    }
}
