//! Administrative account handlers.
//!
//! Every decision about who may act on whom is made by the engine's role
//! policy; these handlers only translate HTTP into engine calls.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::auth::{AccountView, AdminAction, AdminResult, GuardedOperation};
use crate::web::dto::{
    ApiResponse, ChangeRoleRequest, PaginatedResponse, PaginationQuery, ValidatedJson,
};
use crate::web::error::{ApiError, ErrorCode};
use crate::web::handlers::AppState;
use crate::web::middleware::{AuthUser, BearerToken};

/// GET /api/admin/users - List accounts (paginated).
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<AccountView>>, ApiError> {
    let page = state
        .engine
        .list_accounts(&actor, pagination.page, pagination.per_page)
        .await?;
    Ok(Json(PaginatedResponse::from(page)))
}

async fn apply(
    state: &AppState,
    token: Option<&str>,
    target_id: i64,
    action: AdminAction,
) -> Result<Json<ApiResponse<AdminResult>>, ApiError> {
    let actor = state
        .admit(token, GuardedOperation::Admin { target_id, action })
        .await?;
    let outcome = state
        .engine
        .admin_set_account_state(&actor, target_id, action)
        .await;
    Ok(Json(state.complete(outcome).await?))
}

/// DELETE /api/admin/users/:id - Delete an account and its reservations.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AdminResult>>, ApiError> {
    apply(&state, token.as_deref(), id, AdminAction::Delete).await
}

/// PUT /api/admin/users/:id/role - Assign a role.
pub async fn change_role(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<ChangeRoleRequest>,
) -> Result<Json<ApiResponse<AdminResult>>, ApiError> {
    let role = req
        .role()
        .ok_or_else(|| ApiError::new(ErrorCode::ValidationError, "Unknown role"))?;
    apply(&state, token.as_deref(), id, AdminAction::ChangeRole(role)).await
}

/// POST /api/admin/users/:id/disable - Suspend an account.
pub async fn disable_user(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AdminResult>>, ApiError> {
    apply(&state, token.as_deref(), id, AdminAction::Disable).await
}

/// POST /api/admin/users/:id/enable - Lift a suspension.
pub async fn enable_user(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AdminResult>>, ApiError> {
    apply(&state, token.as_deref(), id, AdminAction::Enable).await
}
