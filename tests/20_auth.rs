mod common;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn register_login_and_me() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = Client::new();
    let email = common::unique_email("ada");

    let session = common::register_as(server, &email, "jobseeker").await?;

    let res = client
        .post(server.url("/api/auth/login"))
        .json(&json!({"email": email.to_uppercase(), "password": common::PASSWORD}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["user"]["_id"], session.id.as_str());
    assert!(body["data"]["user"].get("passwordHash").is_none());

    let token = body["data"]["token"].as_str().unwrap();
    let me: Value = client
        .get(server.url("/api/auth/me"))
        .bearer_auth(token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(me["data"]["user"]["email"], email.as_str());
    assert_eq!(me["data"]["user"]["role"], "jobseeker");
    assert_eq!(me["data"]["companies"], json!([]));
    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    let server = common::ensure_server().await?;
    let email = common::unique_email("dup");
    common::register_as(server, &email, "employer").await?;

    let res = Client::new()
        .post(server.url("/api/auth/register"))
        .json(&json!({"email": email, "password": common::PASSWORD, "name": "Again"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn registration_reports_field_errors() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = Client::new()
        .post(server.url("/api/auth/register"))
        .json(&json!({"email": "nope", "password": "short", "name": " ", "role": "wizard"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    for field in ["email", "password", "name", "role"] {
        assert!(body["fieldErrors"][field].is_string(), "missing {}", field);
    }
    Ok(())
}

#[tokio::test]
async fn bad_credentials_and_tokens_are_unauthorized() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = Client::new();
    let session = common::register(server, "jobseeker").await?;

    let res = client
        .post(server.url("/api/auth/login"))
        .json(&json!({"email": session.email, "password": "wrong-password1"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.get(server.url("/api/auth/me")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(server.url("/api/auth/me"))
        .bearer_auth("not.a.token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["success"], false);
    Ok(())
}
