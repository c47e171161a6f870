//! Router configuration for the HTTP API.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    change_password, change_role, confirm_verification, delete_user, disable_user, enable_user,
    first_change_password, forgot_password, get_me, list_users, login, register,
    request_verification, reset_password, update_me, update_notifications, validate_reset_token,
    AppState,
};
use super::middleware::{
    create_cors_layer, login_rate_limit, verification_rate_limit, RateLimitState,
};

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    rate_limit: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    // Credential-guessing routes are throttled per client
    let login_limit = rate_limit.clone();
    let login_route = Router::new().route("/login", post(login)).route_layer(
        middleware::from_fn(move |req, next| {
            let state = login_limit.clone();
            login_rate_limit(state, req, next)
        }),
    );

    let verification_routes = Router::new()
        .route("/verification", post(request_verification))
        .route("/verification/confirm", post(confirm_verification))
        .route_layer(middleware::from_fn(move |req, next| {
            let state = rate_limit.clone();
            verification_rate_limit(state, req, next)
        }));

    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/forgot-password", post(forgot_password))
        .route(
            "/reset-password/:token/:id",
            get(validate_reset_token).post(reset_password),
        )
        .merge(login_route)
        .merge(verification_routes);

    let user_routes = Router::new()
        .route("/me", get(get_me).put(update_me))
        .route("/me/password", put(change_password))
        .route("/me/first-password", post(first_change_password))
        .route("/me/notifications", put(update_notifications));

    let admin_routes = Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", delete(delete_user))
        .route("/users/:id/role", put(change_role))
        .route("/users/:id/disable", post(disable_user))
        .route("/users/:id/enable", post(enable_user));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/admin", admin_routes);

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
