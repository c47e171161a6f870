//! DeskSync - account security and authorization service
//!
//! Registration, login, password rotation and reset, and role-based account
//! administration for a workspace-booking backend.

pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod delivery;
pub mod effects;
pub mod error;
pub mod logging;
pub mod web;

pub use auth::{AuthError, AuthorizationEngine, EngineSettings};
pub use config::Config;
pub use db::{Account, Database, Role};
pub use effects::{Completion, EffectExecutor, Outcome};
pub use error::{DeskSyncError, Result};
