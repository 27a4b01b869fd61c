use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::auth::{JwtService, PasswordHasher};
use crate::database::{Database, FolderStore};
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::AccountService;

/// Shared handles for every request
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub jwt: Arc<JwtService>,
    pub folders: Arc<dyn FolderStore>,
    pub hasher: Arc<dyn PasswordHasher>,
    /// Absent when running on in-memory stores
    pub db: Option<Database>,
}

pub fn app(state: AppState, enable_cors: bool) -> Router {
    let router = Router::new()
        .route("/", get(public::root))
        .route("/ping", get(public::ping))
        .route("/health", get(public::health))
        .merge(account_routes())
        .merge(protected_routes(state.clone()))
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    id = %Uuid::new_v4(),
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        );

    let router = if enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}

fn account_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/register", post(auth::register_post))
        .route("/login", post(auth::login_post))
        .route("/activate", get(auth::activate_missing))
        .route("/activate/", get(auth::activate_missing))
        .route("/activate/:token", get(auth::activate_get))
        .route("/forgot-password", post(auth::forgot_password_post))
        .route("/renew-password", post(auth::renew_password_missing))
        .route("/renew-password/", post(auth::renew_password_missing))
        .route("/renew-password/:token", post(auth::renew_password_post))
        .route("/newtoken", post(auth::newtoken_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/user", get(protected::folders_list))
        .route("/user/whoami", get(protected::whoami_get))
        .route("/user/:folder_id", post(protected::folder_unlock))
        .route("/user/:folder_id/remove_folder", delete(protected::folder_remove))
        .route("/new_folder", post(protected::folder_create))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

async fn not_found() -> ApiError {
    ApiError::not_found("route not found")
}
