// handlers/public/auth/register.rs - POST /register

use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, JsonOrForm};

#[derive(Debug, Deserialize)]
pub struct RegistrationData {
    pub email: String,
    pub password: String,
}

/// POST /register - Create a pending account and send its activation email
///
/// Responds with `{"id": <user id>}`. The account cannot log in until the emailed
/// link has been opened.
pub async fn register_post(
    State(state): State<AppState>,
    JsonOrForm(body): JsonOrForm<RegistrationData>,
) -> ApiResult<Value> {
    let id = state.accounts.register(&body.email, &body.password).await?;
    Ok(ApiResponse::success(json!({ "id": id })))
}
