use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::error::ApiError;

/// Success envelope: `{"success": true, "data": ...}`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data,
            status: StatusCode::OK,
        }
    }
}

impl ApiResponse<serde_json::Value> {
    /// `data = {"message": ...}` for operations with nothing else to return
    pub fn message(message: impl Into<String>) -> Self {
        Self::success(json!({ "message": message.into() }))
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let data = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return ApiError::internal_server_error("Failed to serialize response data").into_response();
            }
        };

        (self.status, Json(json!({ "success": true, "data": data }))).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;
