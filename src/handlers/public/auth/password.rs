// handlers/public/auth/password.rs - POST /forgot-password, POST /renew-password/:token

use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::Value;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonOrForm};

#[derive(Debug, Deserialize)]
pub struct ForgotPassword {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct RenewPassword {
    pub password: String,
}

/// POST /forgot-password - Issue a fresh token and email a reset link
pub async fn forgot_password_post(
    State(state): State<AppState>,
    JsonOrForm(body): JsonOrForm<ForgotPassword>,
) -> ApiResult<Value> {
    state.accounts.forgot_password(&body.email).await?;
    Ok(ApiResponse::message("A password reset link was sent"))
}

/// POST /renew-password/:token - Set a new password with the emailed token
pub async fn renew_password_post(
    State(state): State<AppState>,
    Path(token): Path<String>,
    JsonOrForm(body): JsonOrForm<RenewPassword>,
) -> ApiResult<Value> {
    if token.is_empty() {
        return Err(ApiError::bad_request("Missing token parameter"));
    }

    state.accounts.reset_password(&token, &body.password).await?;
    Ok(ApiResponse::message("The password was successfully updated"))
}

/// POST /renew-password - The token path segment is missing
pub async fn renew_password_missing() -> ApiError {
    ApiError::bad_request("Missing token parameter")
}
