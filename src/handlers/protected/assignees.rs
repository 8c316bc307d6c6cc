use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::user_service::{self, AssigneeListing};

/// GET /assignees - picker data. Channel partners choose a role, staff
/// roles see the eligible users with workload counts.
pub async fn assignees_get(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    match user_service::list_assignees(&user).await? {
        AssigneeListing::RoleOptions => {
            let role_options = json!([
                {
                    "id": "technical",
                    "name": "Technical Support",
                    "role": "technical",
                    "department": "Technical Support",
                    "isRoleBased": true,
                },
                {
                    "id": "assignee",
                    "name": "Assignee",
                    "role": "assignee",
                    "department": "Support",
                    "isRoleBased": true,
                },
            ]);

            Ok(Json(json!({
                "assignees": role_options,
                "count": 2,
                "isRoleBased": true,
            })))
        }
        AssigneeListing::Users(rows) => {
            let assignees: Vec<Value> = rows
                .iter()
                .map(|row| {
                    json!({
                        "id": row.id.to_string(),
                        "email": row.email,
                        "name": row.name,
                        "role": row.role,
                        "department": row.department,
                        "location": row.location,
                        "createdAt": row.created_at,
                        "assignedTickets": row.assigned_tickets,
                        "activeTickets": row.active_tickets,
                    })
                })
                .collect();

            Ok(Json(json!({
                "assignees": assignees,
                "count": assignees.len(),
                "isRoleBased": false,
            })))
        }
    }
}
