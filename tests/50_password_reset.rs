mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use stash_api::database::User;

#[tokio::test]
async fn reset_with_fresh_token_only() -> Result<()> {
    let app = common::TestApp::new();
    app.signed_in("alice@example.com", "secret1").await?;
    let registration_token = app.users.get_by_email("alice@example.com").expect("user").activation_token;

    let (status, _) = app
        .post_json("/forgot-password", None, json!({ "email": "alice@example.com" }))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let fresh = app.mailed_token("alice@example.com");
    let stored = app.users.get_by_email("alice@example.com").expect("user");
    assert_ne!(stored.activation_token, registration_token);
    assert!(fresh.ends_with(&stored.activation_token));

    let mail = app.mailer.last_to("alice@example.com").expect("reset mail");
    assert!(mail.html_body.contains(&format!("http://localhost:3000/renew-password/{}", fresh)));

    // Token that was current before the forgot-password request
    let stale = format!("{}_{}", stored.id, registration_token);
    let (status, body) = app
        .post_json(&format!("/renew-password/{}", stale), None, json!({ "password": "new-secret" }))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");

    let (status, _) = app
        .post_json(&format!("/renew-password/{}", fresh), None, json!({ "password": "new-secret" }))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.login("alice@example.com", "secret1").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.login("alice@example.com", "new-secret").await?;
    assert_eq!(status, StatusCode::OK);

    // The reset link is spent
    let (status, body) = app
        .post_json(&format!("/renew-password/{}", fresh), None, json!({ "password": "third-secret" }))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");
    Ok(())
}

#[tokio::test]
async fn forgot_password_invalidates_pending_activation() -> Result<()> {
    let app = common::TestApp::new();
    app.register("alice@example.com", "secret1").await?;
    let activation = app.mailed_token("alice@example.com");

    app.post_json("/forgot-password", None, json!({ "email": "alice@example.com" }))
        .await?;

    let (status, body) = app.get(&format!("/activate/{}", activation), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_ACTIVATION_TOKEN");
    Ok(())
}

#[tokio::test]
async fn forgot_password_for_unknown_email() -> Result<()> {
    let app = common::TestApp::new();
    let (status, _) = app
        .post_json("/forgot-password", None, json!({ "email": "ghost@example.com" }))
        .await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.mailer.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn forgot_password_mail_failure_is_reported() -> Result<()> {
    let app = common::TestApp::with_failing_mailer();
    app.users.insert(User {
        id: 0,
        email: "alice@example.com".to_string(),
        pass_hash: "irrelevant".to_string(),
        is_activated: true,
        is_admin: false,
        activation_token: "old-token".to_string(),
    });

    let (status, body) = app
        .post_json("/forgot-password", None, json!({ "email": "alice@example.com" }))
        .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "MAIL_DELIVERY_FAILED");

    // No compensation: the user stays, with a replaced token
    let user = app.users.get_by_email("alice@example.com").expect("user");
    assert_ne!(user.activation_token, "old-token");
    Ok(())
}

#[tokio::test]
async fn renew_password_rejects_bad_input() -> Result<()> {
    let app = common::TestApp::new();
    app.signed_in("alice@example.com", "secret1").await?;
    app.post_form("/forgot-password", "email=alice%40example.com").await?;
    let fresh = app.mailed_token("alice@example.com");

    let (status, body) = app
        .post_json("/renew-password/garbage", None, json!({ "password": "new-secret" }))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "MALFORMED_TOKEN");

    let (status, body) = app
        .post_json(&format!("/renew-password/{}", fresh), None, json!({ "password": "123" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = app
        .post_json("/renew-password/", None, json!({ "password": "new-secret" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A rejected attempt leaves the link usable
    let (status, _) = app
        .post_form(&format!("/renew-password/{}", fresh), "password=new-secret")
        .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
