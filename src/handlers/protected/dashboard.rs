use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::api::format::{ticket_summary_to_dto, user_to_dto};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::stats_service::{self, BreakdownRow};

fn breakdown_json(rows: &[BreakdownRow], label_key: &str) -> Vec<Value> {
    rows.iter()
        .map(|row| {
            let mut obj = serde_json::Map::new();
            obj.insert(label_key.to_string(), json!(row.label));
            obj.insert("total".to_string(), json!(row.total));
            obj.insert("open".to_string(), json!(row.open));
            obj.insert("inProgress".to_string(), json!(row.in_progress));
            obj.insert("resolved".to_string(), json!(row.resolved));
            obj.insert("closed".to_string(), json!(row.closed));
            Value::Object(obj)
        })
        .collect()
}

/// GET /dashboard - identity plus the full scoped aggregate view
pub async fn dashboard_get(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let data = stats_service::dashboard_data(&user).await?;
    let stats = &data.stats;

    Ok(Json(json!({
        "user": user_to_dto(&data.user),
        "stats": {
            "total": stats.total_tickets,
            "open": stats.open_tickets,
            "inProgress": stats.in_progress_tickets,
            "pendingApproval": stats.pending_approval_tickets,
            "resolved": stats.resolved_tickets,
            "closed": stats.closed_tickets,
            "urgent": stats.urgent_tickets,
            "highPriority": stats.high_priority_tickets,
            "mediumPriority": stats.medium_priority_tickets,
            "lowPriority": stats.low_priority_tickets,
            "assignedToMe": stats.assigned_to_me,
            "createdByMe": stats.created_by_me,
            "overdue": stats.overdue_tickets,
        },
        "categoryBreakdown": breakdown_json(&data.category_breakdown, "category"),
        "priorityBreakdown": breakdown_json(&data.priority_breakdown, "priority"),
        "recentTickets": data.recent_tickets.iter().map(ticket_summary_to_dto).collect::<Vec<_>>(),
        "overdueTickets": data.overdue_tickets.iter().map(ticket_summary_to_dto).collect::<Vec<_>>(),
        "userRole": user.role,
    })))
}

/// GET /dashboard/stats - headline numbers plus the detailed blocks
pub async fn dashboard_stats_get(
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let data = stats_service::dashboard_data(&user).await?;
    let stats = &data.stats;

    Ok(Json(json!({
        "stats": {
            "totalTickets": stats.total_tickets,
            "openTickets": stats.open_tickets,
            "inProgressTickets": stats.in_progress_tickets,
            "resolvedTickets": stats.resolved_tickets,
            "avgResolutionTime": data.avg_resolution_days,
        },
        "detailedStats": {
            "total": stats.total_tickets,
            "open": stats.open_tickets,
            "inProgress": stats.in_progress_tickets,
            "pendingApproval": stats.pending_approval_tickets,
            "resolved": stats.resolved_tickets,
            "closed": stats.closed_tickets,
            "urgent": stats.urgent_tickets,
            "highPriority": stats.high_priority_tickets,
            "assignedToMe": stats.assigned_to_me,
            "createdByMe": stats.created_by_me,
        },
        "categoryBreakdown": breakdown_json(&data.category_breakdown, "category"),
        "priorityBreakdown": breakdown_json(&data.priority_breakdown, "priority"),
        "recentTickets": data.recent_tickets.iter().map(ticket_summary_to_dto).collect::<Vec<_>>(),
        "overdueTickets": data.overdue_tickets.iter().map(ticket_summary_to_dto).collect::<Vec<_>>(),
        "userRole": user.role,
    })))
}
