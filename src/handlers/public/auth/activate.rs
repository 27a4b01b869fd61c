// handlers/public/auth/activate.rs - GET /activate/:token

use axum::extract::{Path, State};
use serde_json::Value;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /activate/:token - Consume the `<id>_<token>` sent by email
pub async fn activate_get(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Value> {
    if token.is_empty() {
        return Err(ApiError::bad_request("Your request is not valid"));
    }

    state.accounts.activate(&token).await?;
    Ok(ApiResponse::message("The account was successfully activated"))
}

/// GET /activate - The token path segment is missing
pub async fn activate_missing() -> ApiError {
    ApiError::bad_request("Your request is not valid")
}
