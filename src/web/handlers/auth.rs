//! Authentication handlers: registration, login, password reset and
//! device verification.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::auth::{AccountView, SessionGrant};
use crate::web::dto::{
    ApiResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
    ResetPasswordRequest, ValidatedJson, VerificationConfirmRequest, VerificationRequest,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// POST /api/auth/register - Create an account and email its credentials.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountView>>), ApiError> {
    let outcome = state.engine.register(&req.email).await;
    let response = state.complete(outcome).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login - Exchange credentials for a session token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<SessionGrant>>, ApiError> {
    let outcome = state.engine.authenticate(&req.identifier, &req.password).await;
    Ok(Json(state.complete(outcome).await?))
}

/// POST /api/auth/forgot-password - Email a password reset link.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let outcome = state
        .engine
        .forgot_password(&req.email)
        .await
        .map(|()| MessageResponse::new("Password reset email sent"));
    Ok(Json(state.complete(outcome).await?))
}

/// GET /api/auth/reset-password/:token/:id - Check a reset link before showing the form.
pub async fn validate_reset_token(
    State(state): State<Arc<AppState>>,
    Path((token, id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.engine.validate_reset_token(id, &token).await?;
    Ok(Json(ApiResponse::new(MessageResponse::new(
        "Reset link is valid",
    ))))
}

/// POST /api/auth/reset-password/:token/:id - Set a new password from a reset link.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Path((token, id)): Path<(String, i64)>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let outcome = state
        .engine
        .reset_password(id, &token, &req.new_password, &req.confirm_password)
        .await
        .map(|()| MessageResponse::new("Password reset successfully"));
    Ok(Json(state.complete(outcome).await?))
}

/// POST /api/auth/verification - Email a device verification code.
pub async fn request_verification(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<VerificationRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let outcome = state
        .engine
        .request_device_verification(&req.email)
        .await
        .map(|()| MessageResponse::new("Verification code sent"));
    Ok(Json(state.complete(outcome).await?))
}

/// POST /api/auth/verification/confirm - Confirm a device verification code.
pub async fn confirm_verification(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<VerificationConfirmRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let outcome = state
        .engine
        .confirm_device_verification(&req.email, &req.code)
        .await
        .map(|()| MessageResponse::new("Device verified"));
    Ok(Json(state.complete(outcome).await?))
}
