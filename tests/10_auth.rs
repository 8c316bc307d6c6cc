mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn register_login_and_whoami() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let account = common::register_account(&client, &server.base_url, "channel_partner").await?;

    // Login with the same credentials
    let resp = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "email": account.email, "password": "correct horse battery staple" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["role"], "channel_partner");

    // Token resolves back to the same identity
    let resp = client
        .get(format!("{}/auth/me", server.base_url))
        .header("Authorization", common::bearer(&account))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["user"]["id"], Value::String(account.user_id.clone()));
    assert_eq!(body["user"]["email"], Value::String(account.email.clone()));

    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let account = common::register_account(&client, &server.base_url, "assignee").await?;

    let resp = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&json!({
            "email": account.email,
            "password": "another password",
            "name": "imposter",
            "role": "assignee",
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await?;
    assert!(body["error"].as_str().is_some());

    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let account = common::register_account(&client, &server.base_url, "technical").await?;

    let resp = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "email": account.email, "password": "not the password" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_missing_and_garbage_tokens() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/tickets", server.base_url))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .get(format!("{}/tickets", server.base_url))
        .header("Authorization", "Bearer not-a-real-token")
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn developer_support_cannot_self_register() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&json!({
            "email": common::unique_email("devsupport"),
            "password": "some password",
            "name": "dev support",
            "role": "developer_support",
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    Ok(())
}
