// handlers/public/auth/login.rs - POST /login

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, JsonOrForm};

#[derive(Debug, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: i64,
    pub admin: bool,
    pub token: String,
    pub refresh_token: String,
}

/// POST /login - Authenticate credentials and receive an access/refresh pair
///
/// Expected Input (JSON or form-encoded):
/// ```json
/// { "email": "alice@example.com", "password": "secret1" }
/// ```
///
/// Failures: 400 invalid credentials, 403 account not activated.
pub async fn login_post(
    State(state): State<AppState>,
    JsonOrForm(credentials): JsonOrForm<LoginCredentials>,
) -> ApiResult<LoginResponse> {
    let outcome = state
        .accounts
        .login(&credentials.email, &credentials.password)
        .await?;

    Ok(ApiResponse::success(LoginResponse {
        id: outcome.user_id,
        admin: outcome.is_admin,
        token: outcome.tokens.access_token,
        refresh_token: outcome.tokens.refresh_token,
    }))
}
