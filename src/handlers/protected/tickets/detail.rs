use axum::{extract::Path, Extension, Json};
use serde_json::{json, Value};

use crate::api::format::{comment_to_dto, ticket_to_dto};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::ticket_service::{self, UpdateTicketRequest};

use super::parse_ticket_id;

/// GET /tickets/:id - guard-checked read including the comment thread
pub async fn ticket_get(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_ticket_id(&id)?;
    let (row, comment_rows) = ticket_service::get_ticket(&user, id).await?;
    let comments = comment_rows.iter().map(comment_to_dto).collect();

    Ok(Json(json!({ "ticket": ticket_to_dto(&row, comments) })))
}

/// PUT /tickets/:id - partial update of any editable field
pub async fn ticket_put(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTicketRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_ticket_id(&id)?;
    let row = ticket_service::update_ticket(&user, id, payload).await?;

    Ok(Json(json!({
        "ticket": ticket_to_dto(&row, Vec::new()),
        "message": "Ticket updated successfully",
    })))
}

/// DELETE /tickets/:id - comments go with the ticket (cascade)
pub async fn ticket_delete(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_ticket_id(&id)?;
    ticket_service::delete_ticket(&user, id).await?;

    Ok(Json(json!({ "message": "Ticket deleted successfully" })))
}
