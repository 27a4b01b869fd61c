mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::Duration;

use stash_api::auth::{JwtService, JwtSettings};

#[tokio::test]
async fn whoami_accepts_raw_and_bearer_tokens() -> Result<()> {
    let app = common::TestApp::new();
    let (id, access, _) = app.signed_in("alice@example.com", "secret1").await?;

    for header in [access.clone(), format!("Bearer {}", access), format!("bearer {}", access)] {
        let (status, body) = app.get("/user/whoami", Some(&header)).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], id);
        assert_eq!(body["data"]["email"], "alice@example.com");
        assert_eq!(body["data"]["is_activated"], true);
    }
    Ok(())
}

#[tokio::test]
async fn missing_or_blank_header_is_unauthorized() -> Result<()> {
    let app = common::TestApp::new();

    let (status, body) = app.get("/user/whoami", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], true);

    let (status, _) = app.get("/user", Some("")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn bearer_without_token_is_forbidden() -> Result<()> {
    let app = common::TestApp::new();
    let (status, body) = app.get("/user/whoami", Some("Bearer ")).await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NO_TOKEN_PROVIDED");
    Ok(())
}

#[tokio::test]
async fn expired_access_token() -> Result<()> {
    let app = common::TestApp::new();
    let (_, access, _) = app.signed_in("alice@example.com", "secret1").await?;

    app.clock.advance(Duration::hours(24) + Duration::seconds(1));

    let (status, body) = app.get("/user/whoami", Some(&access)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "JWT_EXPIRED");
    Ok(())
}

#[tokio::test]
async fn tampered_and_foreign_tokens_are_forbidden() -> Result<()> {
    let app = common::TestApp::new();
    let (id, access, _) = app.signed_in("alice@example.com", "secret1").await?;

    // Flip one character in the middle of the signature
    let signature_start = access.rfind('.').expect("three segments") + 1;
    let middle = signature_start + (access.len() - signature_start) / 2;
    let mut tampered = access.clone().into_bytes();
    tampered[middle] = if tampered[middle] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered)?;

    let (status, body) = app.get("/user/whoami", Some(&tampered)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "INVALID_TOKEN");

    let foreign = JwtService::new(JwtSettings::new("some-other-secret"))?
        .issue_token_pair(id, "alice@example.com", true)?;
    let (status, body) = app.get("/user/whoami", Some(&foreign.access_token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "INVALID_TOKEN");

    let (status, _) = app.get("/user/whoami", Some("Bearer not-a-jwt")).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn tokens_of_inactive_accounts_are_forbidden() -> Result<()> {
    let app = common::TestApp::new();
    let (_, body) = app.register("alice@example.com", "secret1").await?;
    let id = body["data"]["id"].as_i64().expect("id");

    let pair = app.jwt.issue_token_pair(id, "alice@example.com", false)?;
    let (status, body) = app.get("/user/whoami", Some(&pair.access_token)).await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ACCOUNT_NOT_ACTIVATED");
    Ok(())
}

#[tokio::test]
async fn public_routes_ignore_authorization() -> Result<()> {
    let app = common::TestApp::new();
    let (status, _) = app.get("/ping", Some("Bearer garbage")).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
