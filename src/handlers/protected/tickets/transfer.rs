use axum::{extract::Query, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::format::ticket_to_dto;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::ticket_service::{self, TransferRequest};

/// POST /tickets/transfer - reassign a ticket to another eligible user
pub async fn transfer_post(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<TransferRequest>,
) -> Result<Json<Value>, ApiError> {
    let outcome = ticket_service::transfer_ticket(&user, payload).await?;
    let verb = if outcome.previously_assigned { "transferred" } else { "assigned" };

    Ok(Json(json!({
        "success": true,
        "message": format!("Ticket successfully {} to {}", verb, outcome.assignee.name),
        "ticket": ticket_to_dto(&outcome.ticket, Vec::new()),
        "assignee": {
            "id": outcome.assignee.id.to_string(),
            "name": outcome.assignee.name,
            "role": outcome.assignee.role,
            "department": outcome.assignee.department,
        },
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferHistoryQuery {
    pub ticket_id: Option<String>,
}

/// GET /tickets/transfer?ticketId= - reassignment audit trail
pub async fn transfer_get(
    Extension(user): Extension<AuthUser>,
    Query(query): Query<TransferHistoryQuery>,
) -> Result<Json<Value>, ApiError> {
    let ticket_id = query
        .ticket_id
        .as_deref()
        .ok_or_else(|| ApiError::validation_error("Missing ticketId parameter"))?
        .trim()
        .parse::<i64>()
        .map_err(|_| ApiError::validation_error("Invalid ticketId parameter"))?;

    let rows = ticket_service::transfer_history(&user, ticket_id).await?;
    let history: Vec<Value> = rows
        .iter()
        .map(|row| {
            json!({
                "id": row.id.to_string(),
                "userId": row.user_id.to_string(),
                "userName": row.user_name,
                "userRole": row.user_role,
                "content": row.content,
                "createdAt": row.created_at,
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "transferHistory": history,
    })))
}
