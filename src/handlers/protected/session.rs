// handlers/protected/session.rs - GET /user/whoami

use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /user/whoami - Claims of the access token on this request
pub async fn whoami_get(user: AuthUser) -> ApiResult<AuthUser> {
    Ok(ApiResponse::success(user))
}
