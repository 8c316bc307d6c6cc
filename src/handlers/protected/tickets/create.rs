use axum::{http::StatusCode, Extension, Json};
use serde_json::{json, Value};

use crate::api::format::ticket_to_dto;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::ticket_service::{self, CreateTicketRequest};

/// POST /tickets - open a new ticket
pub async fn tickets_post(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let row = ticket_service::create_ticket(&user, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ticket": ticket_to_dto(&row, Vec::new()),
            "message": "Ticket created successfully",
        })),
    ))
}
