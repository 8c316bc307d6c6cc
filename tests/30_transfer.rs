mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn create_open_ticket(
    client: &reqwest::Client,
    base_url: &str,
    creator: &common::TestAccount,
) -> Result<String> {
    let resp = client
        .post(format!("{}/tickets", base_url))
        .header("Authorization", common::bearer(creator))
        .json(&json!({
            "title": "transferable",
            "description": "open and unassigned",
            "category": "technical",
            "priority": "medium",
        }))
        .send()
        .await?;
    anyhow::ensure!(resp.status() == StatusCode::CREATED);
    let body: Value = resp.json().await?;
    Ok(body["ticket"]["id"].as_str().expect("ticket id").to_string())
}

#[tokio::test]
async fn transfer_bumps_open_to_in_progress_and_records_history() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let partner = common::register_account(&client, &server.base_url, "channel_partner").await?;
    let assignee = common::register_account(&client, &server.base_url, "assignee").await?;
    let ticket_id = create_open_ticket(&client, &server.base_url, &partner).await?;

    let resp = client
        .post(format!("{}/tickets/transfer", server.base_url))
        .header("Authorization", common::bearer(&partner))
        .json(&json!({ "ticketId": ticket_id, "assigneeId": assignee.user_id }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["ticket"]["status"], "in_progress");
    assert_eq!(
        body["ticket"]["assignedTo"],
        Value::String(assignee.user_id.clone())
    );

    // The audit comment is visible as transfer history
    let resp = client
        .get(format!(
            "{}/tickets/transfer?ticketId={}",
            server.base_url, ticket_id
        ))
        .header("Authorization", common::bearer(&partner))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    let history = body["transferHistory"].as_array().expect("history");
    assert_eq!(history.len(), 1);
    assert!(history[0]["content"]
        .as_str()
        .expect("content")
        .contains("assigned to"));

    Ok(())
}

#[tokio::test]
async fn transfer_leaves_later_statuses_alone() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let partner = common::register_account(&client, &server.base_url, "channel_partner").await?;
    let first = common::register_account(&client, &server.base_url, "assignee").await?;
    let second = common::register_account(&client, &server.base_url, "assignee").await?;
    let ticket_id = create_open_ticket(&client, &server.base_url, &partner).await?;

    // Resolve it via its assignee, then transfer again
    let resp = client
        .post(format!("{}/tickets/transfer", server.base_url))
        .header("Authorization", common::bearer(&partner))
        .json(&json!({ "ticketId": ticket_id, "assigneeId": first.user_id }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .put(format!("{}/tickets/{}", server.base_url, ticket_id))
        .header("Authorization", common::bearer(&first))
        .json(&json!({ "status": "resolved" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{}/tickets/transfer", server.base_url))
        .header("Authorization", common::bearer(&first))
        .json(&json!({ "ticketId": ticket_id, "assigneeId": second.user_id }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["ticket"]["status"], "resolved");

    Ok(())
}

#[tokio::test]
async fn ineligible_assignee_is_rejected_without_mutation() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let partner = common::register_account(&client, &server.base_url, "channel_partner").await?;
    let other_partner =
        common::register_account(&client, &server.base_url, "channel_partner").await?;
    let ticket_id = create_open_ticket(&client, &server.base_url, &partner).await?;

    // A channel partner is not an eligible assignee
    let resp = client
        .post(format!("{}/tickets/transfer", server.base_url))
        .header("Authorization", common::bearer(&partner))
        .json(&json!({ "ticketId": ticket_id, "assigneeId": other_partner.user_id }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // And the ticket is untouched
    let resp = client
        .get(format!("{}/tickets/{}", server.base_url, ticket_id))
        .header("Authorization", common::bearer(&partner))
        .send()
        .await?;
    let body: Value = resp.json().await?;
    assert_eq!(body["ticket"]["status"], "open");
    assert!(body["ticket"]["assignedTo"].is_null() || body["ticket"]["assignedTo"].as_str().is_none());

    Ok(())
}

#[tokio::test]
async fn concurrent_takes_of_one_open_ticket_yield_one_winner() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let partner = common::register_account(&client, &server.base_url, "channel_partner").await?;
    let first = common::register_account(&client, &server.base_url, "assignee").await?;
    let second = common::register_account(&client, &server.base_url, "assignee").await?;
    let ticket_id = create_open_ticket(&client, &server.base_url, &partner).await?;

    let take = |account: &common::TestAccount, assignee_id: &str| {
        let client = client.clone();
        let url = format!("{}/tickets/transfer", server.base_url);
        let auth = common::bearer(account);
        let payload = json!({ "ticketId": ticket_id, "assigneeId": assignee_id });
        async move {
            client
                .post(url)
                .header("Authorization", auth)
                .json(&payload)
                .send()
                .await
        }
    };

    let (a, b) = tokio::join!(take(&first, &first.user_id), take(&second, &second.user_id));
    let statuses = [a?.status(), b?.status()];

    // When the reads overlap, the conditional update turns the loser into
    // a 409. If the requests happen to serialize, the second take is a
    // legitimate reassignment; either way nothing is silently overwritten.
    let winners = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let conflicts = statuses
        .iter()
        .filter(|s| **s == StatusCode::CONFLICT)
        .count();
    assert!(winners >= 1, "at least one take must win: {:?}", statuses);
    assert_eq!(
        winners + conflicts,
        2,
        "every take must end in a win or a conflict: {:?}",
        statuses
    );

    // Each winning take left exactly one audit comment
    let resp = client
        .get(format!(
            "{}/tickets/transfer?ticketId={}",
            server.base_url, ticket_id
        ))
        .header("Authorization", common::bearer(&first))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    let history = body["transferHistory"].as_array().expect("history");
    assert_eq!(history.len(), winners);

    Ok(())
}
