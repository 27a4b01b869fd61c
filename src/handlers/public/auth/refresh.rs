// handlers/public/auth/refresh.rs - POST /newtoken

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonOrForm};
use crate::services::AccountError;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub id: i64,
    pub token: String,
    pub refresh_token: String,
}

/// POST /newtoken - Trade a refresh token for a new access/refresh pair
///
/// Every client-side failure is a 400: bad or expired token, unknown user, account not
/// activated.
pub async fn newtoken_post(
    State(state): State<AppState>,
    JsonOrForm(body): JsonOrForm<RefreshRequest>,
) -> ApiResult<RefreshResponse> {
    let outcome = state
        .accounts
        .refresh_token(&body.refresh_token)
        .await
        .map_err(refresh_rejection)?;

    Ok(ApiResponse::success(RefreshResponse {
        id: outcome.user_id,
        token: outcome.tokens.access_token,
        refresh_token: outcome.tokens.refresh_token,
    }))
}

fn refresh_rejection(err: AccountError) -> ApiError {
    match err {
        AccountError::UserNotFound(_) => {
            ApiError::coded(StatusCode::BAD_REQUEST, "USER_NOT_FOUND", "user not found")
        }
        AccountError::AccountNotActivated => ApiError::coded(
            StatusCode::BAD_REQUEST,
            "ACCOUNT_NOT_ACTIVATED",
            "account is not activated",
        ),
        other => other.into(),
    }
}
