use axum::{extract::Query, http::StatusCode, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::format::{user_to_admin_dto, user_to_dto};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::user_service::{self, ListUsersQuery, RegisterRequest, UpdateUserRequest};

/// GET /users - admin listing with activity counts and grouped stats
pub async fn users_get(
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Value>, ApiError> {
    let listing = user_service::list_users(&user, &query).await?;

    let users: Vec<Value> = listing
        .users
        .iter()
        .map(|row| {
            json!({
                "id": row.id.to_string(),
                "email": row.email,
                "name": row.name,
                "role": row.role,
                "department": row.department,
                "location": row.location,
                "isActive": row.is_active != 0,
                "createdAt": row.created_at,
                "ticketsCreated": row.tickets_created,
                "ticketsAssigned": row.tickets_assigned,
                "ticketsResolved": row.tickets_resolved,
                "ticketsClosed": row.tickets_closed,
            })
        })
        .collect();

    Ok(Json(json!({
        "users": users,
        "count": users.len(),
        "roleStats": listing.role_stats.iter().map(|s| json!({
            "role": s.role,
            "count": s.count,
            "newThisMonth": s.new_this_month,
        })).collect::<Vec<_>>(),
        "departmentStats": listing.department_stats.iter().map(|s| json!({
            "department": s.label,
            "count": s.count,
            "roles": s.roles,
        })).collect::<Vec<_>>(),
        "locationStats": listing.location_stats.iter().map(|s| json!({
            "location": s.label,
            "count": s.count,
            "roles": s.roles,
        })).collect::<Vec<_>>(),
        "filters": {
            "role": query.role,
            "department": query.department,
            "location": query.location,
        },
    })))
}

/// POST /users - admin account creation
pub async fn users_post(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let row = user_service::create_user(&user, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": user_to_dto(&row),
            "message": "User created successfully",
        })),
    ))
}

/// PUT /users - admin account update
pub async fn users_put(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    let row = user_service::update_user(&user, payload).await?;

    Ok(Json(json!({
        "message": "User updated successfully",
        "user": user_to_admin_dto(&row),
    })))
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserQuery {
    pub id: Option<String>,
}

/// DELETE /users?id= - blocked while tickets still reference the user
pub async fn users_delete(
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DeleteUserQuery>,
) -> Result<Json<Value>, ApiError> {
    let user_id = query
        .id
        .as_deref()
        .ok_or_else(|| ApiError::validation_error("User ID is required"))?
        .trim()
        .parse::<i64>()
        .map_err(|_| ApiError::validation_error("User ID is required"))?;

    let name = user_service::delete_user(&user, user_id).await?;

    Ok(Json(json!({
        "message": format!("User {} deleted successfully", name),
    })))
}
