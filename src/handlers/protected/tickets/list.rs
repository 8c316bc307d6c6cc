use axum::{extract::Query, Extension, Json};
use serde_json::{json, Value};

use crate::api::format::tickets_to_dtos;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::ticket_service::{self, ListTicketsQuery};

/// GET /tickets - role-scoped listing with optional equality filters
pub async fn tickets_get(
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListTicketsQuery>,
) -> Result<Json<Value>, ApiError> {
    let rows = ticket_service::list_tickets(&user, &query).await?;
    let tickets = tickets_to_dtos(&rows);

    Ok(Json(json!({
        "tickets": tickets,
        "count": tickets.len(),
    })))
}
