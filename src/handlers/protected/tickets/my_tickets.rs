use axum::{extract::Query, Extension, Json};
use serde_json::{json, Value};

use crate::api::format::tickets_to_dtos;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::ticket_service::{self, MyTicketsQuery};

/// GET /my-tickets - tickets in the caller's working set, urgent first
pub async fn my_tickets_get(
    Extension(user): Extension<AuthUser>,
    Query(query): Query<MyTicketsQuery>,
) -> Result<Json<Value>, ApiError> {
    let (rows, stats) = ticket_service::my_tickets(&user, &query).await?;
    let tickets = tickets_to_dtos(&rows);

    Ok(Json(json!({
        "tickets": tickets,
        "count": tickets.len(),
        "stats": {
            "total": stats.total,
            "open": stats.open_count,
            "inProgress": stats.in_progress_count,
            "pendingApproval": stats.pending_count,
            "resolved": stats.resolved_count,
            "closed": stats.closed_count,
            "urgent": stats.urgent_count,
            "high": stats.high_count,
            "assignedToMe": stats.assigned_to_me,
            "createdByMe": stats.created_by_me,
        },
        "userRole": user.role,
        "filters": {
            "status": query.status,
            "category": query.category,
            "priority": query.priority,
            "type": query.r#type,
        },
    })))
}
