//! Account security and authorization for DeskSync.
//!
//! This module provides password hashing and rotation rules, reset and
//! verification grants, session tokens, the role policy, and the engine
//! that combines them into account operations.

mod engine;
mod error;
pub mod password;
pub mod policy;
pub mod reset_token;
pub mod session;
pub mod validation;
pub mod verification;
mod view;

pub use engine::{AuthorizationEngine, EngineSettings, GuardedOperation, MAX_PER_PAGE};
pub use error::{AuthError, ErrorClass};
pub use password::{HashCost, PasswordError, PasswordHasher};
pub use policy::{AdminAction, PolicyError};
pub use session::{SessionClaims, SessionError, SessionTokens};
pub use validation::ValidationError;
pub use view::{AccountPage, AccountView, AdminResult, SessionGrant};
