#![allow(dead_code)]
//! Shared integration-test harness.
//!
//! Requests go through the assembled router with `tower::ServiceExt::oneshot` instead of a
//! spawned server on a free port, so no binary, port or Postgres instance is needed. The
//! stores, mailer and clock are the in-memory doubles from `stash_api::testing`.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;

use stash_api::auth::{JwtService, JwtSettings, PasswordHasher, Sha256Hasher, TokenGenerator};
use stash_api::database::Database;
use stash_api::mail::Mailer;
use stash_api::services::{AccountPolicy, AccountService};
use stash_api::testing::{FailingMailer, FixedClock, MemoryFolderStore, MemoryUserStore, RecordingMailer};
use stash_api::{app, AppState};

pub const SECRET: &str = "integration-secret";

/// Router wired to in-memory collaborators, plus handles to inspect them
pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUserStore>,
    pub folders: Arc<MemoryFolderStore>,
    pub mailer: Arc<RecordingMailer>,
    pub clock: Arc<FixedClock>,
    pub jwt: Arc<JwtService>,
}

pub fn start_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T09:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(None, None)
    }

    /// Same wiring, but every email is rejected by the provider
    pub fn with_failing_mailer() -> Self {
        Self::build(Some(Arc::new(FailingMailer) as Arc<dyn Mailer>), None)
    }

    /// Same wiring, with `db` answering `/health`
    pub fn with_database(db: Database) -> Self {
        Self::build(None, Some(db))
    }

    fn build(mailer_override: Option<Arc<dyn Mailer>>, db: Option<Database>) -> Self {
        let users = Arc::new(MemoryUserStore::new());
        let folders = Arc::new(MemoryFolderStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let clock = Arc::new(FixedClock::new(start_time()));
        let jwt = Arc::new(
            JwtService::new(JwtSettings::new(SECRET))
                .expect("non-empty secret")
                .with_clock(clock.clone()),
        );
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Sha256Hasher);
        let outbound: Arc<dyn Mailer> = match mailer_override {
            Some(failing) => failing,
            None => mailer.clone(),
        };

        let accounts = AccountService::new(
            users.clone(),
            outbound,
            hasher.clone(),
            jwt.clone(),
            TokenGenerator::new(50),
            AccountPolicy::default(),
        );

        let state = AppState {
            accounts: Arc::new(accounts),
            jwt: jwt.clone(),
            folders: folders.clone(),
            hasher,
            db,
        };

        Self {
            router: app(state, true),
            users,
            folders,
            mailer,
            clock,
            jwt,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Ok((status, body))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(build(Method::GET, uri, token, None)?).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(build(Method::DELETE, uri, token, None)?).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(build(Method::POST, uri, token, Some(body))?).await
    }

    pub async fn post_form(&self, uri: &str, form: &str) -> Result<(StatusCode, Value)> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))?;
        self.request(request).await
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<(StatusCode, Value)> {
        self.post_json("/register", None, serde_json::json!({ "email": email, "password": password }))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(StatusCode, Value)> {
        self.post_json("/login", None, serde_json::json!({ "email": email, "password": password }))
            .await
    }

    /// Latest composite token mailed to `email`
    pub fn mailed_token(&self, email: &str) -> String {
        self.mailer
            .last_token_for(email)
            .unwrap_or_else(|| panic!("no mail was sent to {}", email))
    }

    /// Register, activate and log in; returns (user id, access token, refresh token)
    pub async fn signed_in(&self, email: &str, password: &str) -> Result<(i64, String, String)> {
        let (status, _) = self.register(email, password).await?;
        assert_eq!(status, StatusCode::OK, "register {}", email);

        let token = self.mailed_token(email);
        let (status, _) = self.get(&format!("/activate/{}", token), None).await?;
        assert_eq!(status, StatusCode::OK, "activate {}", email);

        let (status, body) = self.login(email, password).await?;
        assert_eq!(status, StatusCode::OK, "login {}", email);

        let data = &body["data"];
        Ok((
            data["id"].as_i64().expect("id"),
            data["token"].as_str().expect("token").to_string(),
            data["refresh_token"].as_str().expect("refresh_token").to_string(),
        ))
    }
}

fn build(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json)?))?,
        None => builder.body(Body::empty())?,
    };
    Ok(request)
}
