mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn user_admin_is_gated_to_head_office_and_technical() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let partner = common::register_account(&client, &server.base_url, "channel_partner").await?;
    let technical = common::register_account(&client, &server.base_url, "technical").await?;

    let resp = client
        .get(format!("{}/users", server.base_url))
        .header("Authorization", common::bearer(&partner))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .get(format!("{}/users", server.base_url))
        .header("Authorization", common::bearer(&technical))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert!(body["users"].as_array().is_some());
    assert!(body["roleStats"].as_array().is_some());

    Ok(())
}

#[tokio::test]
async fn technical_can_create_but_not_delete_users() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let technical = common::register_account(&client, &server.base_url, "technical").await?;

    let resp = client
        .post(format!("{}/users", server.base_url))
        .header("Authorization", common::bearer(&technical))
        .json(&json!({
            "email": common::unique_email("provisioned"),
            "password": "a decent password",
            "name": "Provisioned User",
            "role": "developer_support",
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await?;
    let created_id = body["user"]["id"].as_str().expect("user id").to_string();

    // Deletion is head office only
    let resp = client
        .delete(format!("{}/users?id={}", server.base_url, created_id))
        .header("Authorization", common::bearer(&technical))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn deleting_a_user_with_tickets_is_blocked() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let head_office = common::register_account(&client, &server.base_url, "head_office").await?;
    let partner = common::register_account(&client, &server.base_url, "channel_partner").await?;

    let resp = client
        .post(format!("{}/tickets", server.base_url))
        .header("Authorization", common::bearer(&partner))
        .json(&json!({
            "title": "anchor",
            "description": "keeps its creator around",
            "category": "general",
            "priority": "low",
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .delete(format!("{}/users?id={}", server.base_url, partner.user_id))
        .header("Authorization", common::bearer(&head_office))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await?;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("Cannot delete user"));

    // The account still works
    let resp = client
        .get(format!("{}/auth/me", server.base_url))
        .header("Authorization", common::bearer(&partner))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn assignee_picker_shape_depends_on_role() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let partner = common::register_account(&client, &server.base_url, "channel_partner").await?;
    let head_office = common::register_account(&client, &server.base_url, "head_office").await?;

    let resp = client
        .get(format!("{}/assignees", server.base_url))
        .header("Authorization", common::bearer(&partner))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["isRoleBased"], json!(true));

    let resp = client
        .get(format!("{}/assignees", server.base_url))
        .header("Authorization", common::bearer(&head_office))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["isRoleBased"], json!(false));

    Ok(())
}
