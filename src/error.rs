// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::JwtError;
use crate::database::DatabaseError;
use crate::services::AccountError;

/// HTTP API error with a status, a client-safe message and a machine-readable code
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),

    /// Any status with a code the client is expected to branch on
    Coded {
        status: u16,
        code: &'static str,
        message: String,
    },
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
            ApiError::Coded { status, .. } => *status,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
            ApiError::Coded { message, .. } => message,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::Coded { code, .. } => *code,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        ApiError::ValidationError(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    pub fn coded(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError::Coded {
            status: status.as_u16(),
            code,
            message: message.into(),
        }
    }

    pub fn jwt_expired() -> Self {
        Self::coded(StatusCode::UNAUTHORIZED, "JWT_EXPIRED", "the jwt token has expired")
    }

    pub fn no_token_provided() -> Self {
        Self::coded(StatusCode::FORBIDDEN, "NO_TOKEN_PROVIDED", "the jwt token was not provided")
    }

    pub fn invalid_token(status: StatusCode, message: impl Into<String>) -> Self {
        Self::coded(status, "INVALID_TOKEN", message)
    }

    pub fn account_not_activated() -> Self {
        Self::coded(StatusCode::FORBIDDEN, "ACCOUNT_NOT_ACTIVATED", "account is not activated")
    }

    pub fn claims_not_exist() -> Self {
        Self::coded(StatusCode::UNAUTHORIZED, "CLAIMS_NOT_EXIST", "no authenticated user on the request")
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::NoTokenProvided => ApiError::no_token_provided(),
            JwtError::TokenExpired => ApiError::jwt_expired(),
            JwtError::InvalidSigningMethod(_) | JwtError::Invalid(_) => {
                ApiError::invalid_token(StatusCode::FORBIDDEN, "invalid jwt token")
            }
            JwtError::TokenGeneration(_) | JwtError::InvalidSecret | JwtError::InvalidLifetime(_) => {
                tracing::error!("JWT error: {}", err);
                ApiError::internal_server_error("Could not issue tokens")
            }
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(format!("Not found: {}", msg)),
            DatabaseError::Conflict(msg) => ApiError::conflict(format!("Already exists: {}", msg)),
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
            other => {
                tracing::error!("Database error: {}", other);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidEmail | AccountError::PasswordTooShort(_) => {
                ApiError::validation_error(err.to_string())
            }
            AccountError::UserAlreadyExists => {
                ApiError::coded(StatusCode::CONFLICT, "USER_ALREADY_EXISTS", err.to_string())
            }
            AccountError::UserNotFound(_) => ApiError::not_found("user not found"),
            AccountError::AccountNotActivated => ApiError::account_not_activated(),
            AccountError::InvalidCredentials => {
                ApiError::coded(StatusCode::BAD_REQUEST, "INVALID_CREDENTIALS", err.to_string())
            }
            AccountError::MalformedToken(_) => {
                ApiError::coded(StatusCode::UNAUTHORIZED, "MALFORMED_TOKEN", "invalid token format")
            }
            AccountError::InvalidActivationToken => ApiError::coded(
                StatusCode::UNAUTHORIZED,
                "INVALID_ACTIVATION_TOKEN",
                err.to_string(),
            ),
            AccountError::InvalidToken => {
                ApiError::invalid_token(StatusCode::UNAUTHORIZED, "invalid token for password update")
            }
            AccountError::InvalidRefreshToken(_) => {
                ApiError::coded(StatusCode::BAD_REQUEST, "INVALID_REFRESH_TOKEN", "invalid refresh token")
            }
            AccountError::Jwt(e) => e.into(),
            AccountError::Mail(e) => {
                tracing::error!("Mail error: {}", e);
                ApiError::coded(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MAIL_DELIVERY_FAILED",
                    "We couldn't send the email at the specified address",
                )
            }
            AccountError::Database(e) => e.into(),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
