//! HTTP API for DeskSync.
//!
//! Exposes the authorization engine as a JSON REST API. Handlers stay thin:
//! they parse requests, call the engine, run the resulting effects and map
//! errors to status codes.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
