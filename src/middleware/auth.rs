use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::app::AppState;
use crate::auth::AccessClaims;
use crate::error::ApiError;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub is_activated: bool,
    pub expires_at: i64,
    pub issuer: String,
}

impl From<AccessClaims> for AuthUser {
    fn from(claims: AccessClaims) -> Self {
        Self {
            id: claims.id,
            email: claims.email,
            is_activated: claims.is_activated,
            expires_at: claims.exp,
            issuer: claims.iss,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context.
///
/// Only activated accounts get through; the handler is never called otherwise.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(request.headers())?;

    let claims = state.jwt.validate(&token).map_err(|e| {
        tracing::debug!("Rejected request token: {}", e);
        ApiError::from(e)
    })?;

    if !claims.is_activated {
        tracing::debug!(user_id = claims.id, "Rejected token of a non-activated account");
        return Err(ApiError::account_not_activated());
    }

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// The raw JWT from the Authorization header, with an optional `Bearer ` prefix (any case)
/// removed.
/// A missing or blank header is rejected here; an empty token after the prefix is left
/// for the validator to report.
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let value = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?
        .trim();

    if value.is_empty() {
        return Err(ApiError::unauthorized("Missing Authorization header"));
    }

    if value.eq_ignore_ascii_case("bearer") {
        return Ok(String::new());
    }

    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim_start(),
        _ => value,
    };
    Ok(token.to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(ApiError::claims_not_exist)
    }
}
