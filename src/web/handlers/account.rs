//! Self-service account handlers.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::auth::{AccountView, GuardedOperation};
use crate::web::dto::{
    ApiResponse, ChangePasswordRequest, FirstPasswordRequest, NotificationPreferenceRequest,
    UpdateProfileRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::{AuthUser, BearerToken};

/// GET /api/users/me - Current account.
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<Json<ApiResponse<AccountView>>, ApiError> {
    let view = state.engine.current_account(&actor).await?;
    Ok(Json(ApiResponse::new(view)))
}

/// PUT /api/users/me - Update username and/or description.
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<AccountView>>, ApiError> {
    let actor = state
        .admit(token.as_deref(), GuardedOperation::UpdateProfile)
        .await?;
    let outcome = state
        .engine
        .update_profile(&actor, req.username.as_deref(), req.description.as_deref())
        .await;
    Ok(Json(state.complete(outcome).await?))
}

/// PUT /api/users/me/password - Change password.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<AccountView>>, ApiError> {
    let actor = state
        .admit(token.as_deref(), GuardedOperation::ChangePassword)
        .await?;
    let outcome = state
        .engine
        .change_password(
            &actor,
            &req.current_password,
            &req.new_password,
            &req.confirm_password,
        )
        .await;
    Ok(Json(state.complete(outcome).await?))
}

/// POST /api/users/me/first-password - Replace the generated password.
pub async fn first_change_password(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    ValidatedJson(req): ValidatedJson<FirstPasswordRequest>,
) -> Result<Json<ApiResponse<AccountView>>, ApiError> {
    let actor = state
        .admit(token.as_deref(), GuardedOperation::FirstChangePassword)
        .await?;
    let outcome = state
        .engine
        .first_change_password(&actor, &req.new_password, &req.confirm_password)
        .await;
    Ok(Json(state.complete(outcome).await?))
}

/// PUT /api/users/me/notifications - Toggle notification emails.
pub async fn update_notifications(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    ValidatedJson(req): ValidatedJson<NotificationPreferenceRequest>,
) -> Result<Json<ApiResponse<AccountView>>, ApiError> {
    let actor = state
        .admit(token.as_deref(), GuardedOperation::UpdateNotificationPreference)
        .await?;
    let outcome = state
        .engine
        .update_notification_preference(&actor, req.receiving_email)
        .await;
    Ok(Json(state.complete(outcome).await?))
}
