mod common;

use anyhow::Result;
use axum::http::StatusCode;

#[tokio::test]
async fn register_activate_login() -> Result<()> {
    let app = common::TestApp::new();

    let (status, body) = app.register("alice@example.com", "secret1").await?;
    assert_eq!(status, StatusCode::OK);
    let id = body["data"]["id"].as_i64().expect("id");
    assert!(!app.users.get_by_email("alice@example.com").expect("user").is_activated);

    let (status, body) = app.login("alice@example.com", "secret1").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ACCOUNT_NOT_ACTIVATED");

    let token = app.mailed_token("alice@example.com");
    let (status, _) = app.get(&format!("/activate/{}", token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(app.users.get_by_email("alice@example.com").expect("user").is_activated);

    let (status, body) = app.login("alice@example.com", "secret1").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], id);
    assert_eq!(body["data"]["admin"], false);

    let access = body["data"]["token"].as_str().expect("token");
    let claims = app.jwt.validate(access)?;
    assert_eq!(claims.id, id);
    assert_eq!(claims.email, "alice@example.com");
    assert!(claims.is_activated);

    let refresh = body["data"]["refresh_token"].as_str().expect("refresh_token");
    assert_eq!(app.jwt.validate_refresh(refresh)?.email, "alice@example.com");
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() -> Result<()> {
    let app = common::TestApp::new();
    app.signed_in("alice@example.com", "secret1").await?;

    let (status, body) = app.login("alice@example.com", "secret2").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
    Ok(())
}

#[tokio::test]
async fn unknown_email_is_invalid_credentials() -> Result<()> {
    let app = common::TestApp::new();

    let (status, body) = app.login("ghost@example.com", "secret1").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
    Ok(())
}

#[tokio::test]
async fn login_accepts_form_bodies() -> Result<()> {
    let app = common::TestApp::new();
    app.signed_in("alice@example.com", "secret1").await?;

    let (status, body) = app
        .post_form("/login", "email=alice%40example.com&password=secret1")
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].is_string());
    Ok(())
}
