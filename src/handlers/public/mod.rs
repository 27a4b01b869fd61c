// handlers/public/mod.rs - Public handlers (no authentication required)

pub mod auth;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

pub use auth::*;

/// GET / - Service name and version
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Stash API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "account": "/register, /login, /activate/:token, /forgot-password, /renew-password/:token, /newtoken (public)",
                "folders": "/user, /new_folder, /user/:folder_id, /user/:folder_id/remove_folder (protected)",
                "session": "/user/whoami (protected)",
                "health": "/health, /ping (public)"
            }
        }
    }))
}

/// GET /ping
pub async fn ping() -> &'static str {
    "pong"
}

/// GET /health - 503 when the database does not answer
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let database = match &state.db {
        Some(db) => {
            db.health_check().await.map_err(|e| {
                tracing::error!("Health check failed: {}", e);
                ApiError::service_unavailable("database unavailable")
            })?;
            "ok"
        }
        None => "not configured",
    };

    Ok(Json(json!({
        "success": true,
        "data": { "status": "ok", "timestamp": chrono::Utc::now(), "database": database }
    })))
}
