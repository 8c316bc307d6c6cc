use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::FromRow;

use crate::auth::{self, password, Claims};
use crate::database::{self, models::UserRow};
use crate::error::ApiError;
use crate::filter::types::IdValue;
use crate::filter::{bind_rows, SqlParam};
use crate::middleware::AuthUser;
use crate::policy;
use crate::types::Role;

/// Roles allowed through self-service registration. Developer support
/// accounts are provisioned by head office only.
const SELF_REGISTER_ROLES: [Role; 4] = [
    Role::ChannelPartner,
    Role::Assignee,
    Role::HeadOffice,
    Role::Technical,
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub role: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub id: Option<IdValue>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
}

/// User row extended with ticket activity counts for the admin listing.
#[derive(Debug, Clone, FromRow)]
pub struct UserStatsRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub is_active: i32,
    pub created_at: DateTime<Utc>,
    pub tickets_created: i64,
    pub tickets_assigned: i64,
    pub tickets_resolved: i64,
    pub tickets_closed: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct RoleStatRow {
    pub role: String,
    pub count: i64,
    pub new_this_month: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct GroupStatRow {
    pub label: String,
    pub count: i64,
    pub roles: i64,
}

/// Eligible assignee with workload counters for the picker.
#[derive(Debug, Clone, FromRow)]
pub struct AssigneeRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub assigned_tickets: i64,
    pub active_tickets: i64,
}

pub struct UserListing {
    pub users: Vec<UserStatsRow>,
    pub role_stats: Vec<RoleStatRow>,
    pub department_stats: Vec<GroupStatRow>,
    pub location_stats: Vec<GroupStatRow>,
}

pub enum AssigneeListing {
    /// Channel partners pick a role, not a person
    RoleOptions,
    Users(Vec<AssigneeRow>),
}

fn issue_token(user: &UserRow) -> Result<String, ApiError> {
    let role = Role::parse(&user.role).ok_or_else(|| {
        tracing::error!("unexpected role in database: {}", user.role);
        ApiError::internal_server_error("Internal server error")
    })?;
    let claims = Claims::new(user.id, user.email.clone(), user.name.clone(), role);
    auth::generate_jwt(claims).map_err(|e| {
        tracing::error!("token generation failed: {}", e);
        ApiError::internal_server_error("Internal server error")
    })
}

async fn fetch_user(user_id: i64) -> Result<Option<UserRow>, ApiError> {
    let pool = database::pool().await?;
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?;
    Ok(row)
}

async fn email_taken(email: &str, exclude_id: Option<i64>) -> Result<bool, ApiError> {
    let pool = database::pool().await?;
    let existing: Option<i64> = match exclude_id {
        Some(id) => {
            sqlx::query_scalar("SELECT id FROM users WHERE email = $1 AND id <> $2")
                .bind(email)
                .bind(id)
                .fetch_optional(&pool)
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&pool)
                .await?
        }
    };
    Ok(existing.is_some())
}

async fn insert_user(
    email: &str,
    password: &str,
    name: &str,
    role: Role,
    department: Option<&str>,
    location: Option<&str>,
) -> Result<UserRow, ApiError> {
    let password_hash = password::hash_password(password).map_err(|e| {
        tracing::error!("password hashing failed: {}", e);
        ApiError::internal_server_error("Internal server error")
    })?;

    let pool = database::pool().await?;
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (email, password_hash, name, role, department, location) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(role.as_str())
    .bind(department)
    .bind(location)
    .fetch_one(&pool)
    .await?;
    Ok(row)
}

/// Self-service registration. Returns the created user and a fresh token.
pub async fn register(request: RegisterRequest) -> Result<(UserRow, String), ApiError> {
    let (email, password, name, role) = match (
        request.email.as_deref().filter(|s| !s.is_empty()),
        request.password.as_deref().filter(|s| !s.is_empty()),
        request.name.as_deref().filter(|s| !s.is_empty()),
        request.role.as_deref(),
    ) {
        (Some(e), Some(p), Some(n), Some(r)) => (e, p, n, r),
        _ => return Err(ApiError::validation_error("Missing required fields")),
    };

    let role = match Role::parse(role) {
        Some(r) if SELF_REGISTER_ROLES.contains(&r) => r,
        _ => return Err(ApiError::validation_error("Invalid role")),
    };

    if email_taken(email, None).await? {
        return Err(ApiError::conflict("User already exists"));
    }

    let user = insert_user(
        email,
        password,
        name,
        role,
        request.department.as_deref(),
        request.location.as_deref(),
    )
    .await?;

    tracing::info!(user = user.id, role = %role, "user registered");

    let token = issue_token(&user)?;
    Ok((user, token))
}

/// Credential check. Both an unknown email and a wrong password produce
/// the same generic 401.
pub async fn login(request: LoginRequest) -> Result<(UserRow, String), ApiError> {
    let (email, password) = match (request.email.as_deref(), request.password.as_deref()) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => return Err(ApiError::validation_error("Email and password are required")),
    };

    let pool = database::pool().await?;
    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(&pool)
        .await?;

    let user = match user {
        Some(u) if password::verify_password(password, &u.password_hash) => u,
        _ => return Err(ApiError::unauthorized("Invalid credentials")),
    };

    let token = issue_token(&user)?;
    Ok((user, token))
}

/// Resolve the identity behind a token.
pub async fn me(user_id: i64) -> Result<UserRow, ApiError> {
    fetch_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// Admin user listing with ticket activity counts and grouped statistics.
pub async fn list_users(actor: &AuthUser, query: &ListUsersQuery) -> Result<UserListing, ApiError> {
    if !policy::capabilities(actor.role).can_view_all_users {
        return Err(ApiError::forbidden(
            "Access denied - Only head office and technical users can view all users",
        ));
    }

    let mut terms: Vec<String> = Vec::new();
    let mut params: Vec<SqlParam> = Vec::new();
    for (column, value) in [
        ("u.role", query.role.as_deref()),
        ("u.department", query.department.as_deref()),
        ("u.location", query.location.as_deref()),
    ] {
        if let Some(value) = value {
            params.push(SqlParam::Text(value.to_string()));
            terms.push(format!("{} = ${}", column, params.len()));
        }
    }
    let where_clause = if terms.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", terms.join(" AND "))
    };

    let pool = database::pool().await?;

    let users_sql = format!(
        "SELECT u.id, u.email, u.name, u.role, u.department, u.location, u.is_active, u.created_at, \
         (SELECT COUNT(*) FROM tickets t WHERE t.created_by = u.id) AS tickets_created, \
         (SELECT COUNT(*) FROM tickets t WHERE t.assigned_to = u.id) AS tickets_assigned, \
         (SELECT COUNT(*) FROM tickets t WHERE t.assigned_to = u.id AND t.status = 'resolved') AS tickets_resolved, \
         (SELECT COUNT(*) FROM tickets t WHERE t.assigned_to = u.id AND t.status = 'closed') AS tickets_closed \
         FROM users u {} ORDER BY u.created_at DESC",
        where_clause
    );
    let users = bind_rows(sqlx::query_as::<_, UserStatsRow>(&users_sql), &params)
        .fetch_all(&pool)
        .await?;

    let role_stats = sqlx::query_as::<_, RoleStatRow>(
        "SELECT role, COUNT(*) AS count, \
         COALESCE(SUM(CASE WHEN created_at >= now() - interval '30 days' THEN 1 ELSE 0 END), 0) AS new_this_month \
         FROM users GROUP BY role ORDER BY count DESC",
    )
    .fetch_all(&pool)
    .await?;

    let department_stats = sqlx::query_as::<_, GroupStatRow>(
        "SELECT department AS label, COUNT(*) AS count, COUNT(DISTINCT role) AS roles \
         FROM users WHERE department IS NOT NULL GROUP BY department ORDER BY count DESC",
    )
    .fetch_all(&pool)
    .await?;

    let location_stats = sqlx::query_as::<_, GroupStatRow>(
        "SELECT location AS label, COUNT(*) AS count, COUNT(DISTINCT role) AS roles \
         FROM users WHERE location IS NOT NULL GROUP BY location ORDER BY count DESC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(UserListing {
        users,
        role_stats,
        department_stats,
        location_stats,
    })
}

/// Admin account creation. Unlike self-registration, any role may be
/// provisioned here.
pub async fn create_user(
    actor: &AuthUser,
    request: RegisterRequest,
) -> Result<UserRow, ApiError> {
    if !policy::capabilities(actor.role).can_create_user {
        return Err(ApiError::forbidden(
            "Access denied - Only head office and technical users can create users",
        ));
    }

    let (email, password, name, role) = match (
        request.email.as_deref().filter(|s| !s.is_empty()),
        request.password.as_deref().filter(|s| !s.is_empty()),
        request.name.as_deref().filter(|s| !s.is_empty()),
        request.role.as_deref(),
    ) {
        (Some(e), Some(p), Some(n), Some(r)) => (e, p, n, r),
        _ => {
            return Err(ApiError::validation_error(
                "Missing required fields: email, password, name, role",
            ))
        }
    };

    let role = Role::parse(role).ok_or_else(|| {
        ApiError::validation_error(format!(
            "Invalid role. Must be one of: {}",
            Role::expected_list()
        ))
    })?;

    if email_taken(email, None).await? {
        return Err(ApiError::conflict("User with this email already exists"));
    }

    let user = insert_user(
        email,
        password,
        name,
        role,
        request.department.as_deref(),
        request.location.as_deref(),
    )
    .await?;

    tracing::info!(user = user.id, actor = actor.user_id, "user created");
    Ok(user)
}

pub async fn update_user(
    actor: &AuthUser,
    request: UpdateUserRequest,
) -> Result<UserRow, ApiError> {
    if !policy::capabilities(actor.role).can_manage_users {
        return Err(ApiError::forbidden("Access denied. Head office role required."));
    }

    let user_id = request
        .id
        .as_ref()
        .ok_or_else(|| ApiError::validation_error("User ID is required"))?
        .as_i64()
        .map_err(|e| ApiError::validation_error(e.to_string()))?;

    let role = match request.role.as_deref() {
        Some(value) => Some(Role::parse(value).ok_or_else(|| {
            ApiError::validation_error(format!(
                "Invalid role. Must be one of: {}",
                Role::expected_list()
            ))
        })?),
        None => None,
    };

    if fetch_user(user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    if let Some(email) = request.email.as_deref() {
        if email_taken(email, Some(user_id)).await? {
            return Err(ApiError::conflict("Email already exists"));
        }
    }

    let mut sets: Vec<String> = Vec::new();
    let mut params: Vec<SqlParam> = Vec::new();

    for (column, value) in [
        ("name", request.name.as_deref()),
        ("email", request.email.as_deref()),
        ("department", request.department.as_deref()),
        ("location", request.location.as_deref()),
    ] {
        if let Some(value) = value {
            params.push(SqlParam::Text(value.to_string()));
            sets.push(format!("{} = ${}", column, params.len()));
        }
    }
    if let Some(role) = role {
        params.push(SqlParam::Text(role.as_str().to_string()));
        sets.push(format!("role = ${}", params.len()));
    }
    if let Some(is_active) = request.is_active {
        params.push(SqlParam::Int(if is_active { 1 } else { 0 }));
        sets.push(format!("is_active = ${}", params.len()));
    }

    if sets.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    sets.push("updated_at = now()".to_string());
    params.push(SqlParam::Int(user_id));
    let sql = format!(
        "UPDATE users SET {} WHERE id = ${}",
        sets.join(", "),
        params.len()
    );

    let pool = database::pool().await?;
    crate::filter::bind_exec(sqlx::query(&sql), &params)
        .execute(&pool)
        .await?;

    tracing::info!(user = user_id, actor = actor.user_id, "user updated");
    me(user_id).await
}

/// Delete an account. Blocked with a descriptive error while any ticket
/// still references the user; no cascade.
pub async fn delete_user(actor: &AuthUser, user_id: i64) -> Result<String, ApiError> {
    if !policy::capabilities(actor.role).can_manage_users {
        return Err(ApiError::forbidden("Access denied. Head office role required."));
    }

    let user = fetch_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let pool = database::pool().await?;

    let assigned: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE assigned_to = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await?;
    if assigned > 0 {
        return Err(ApiError::bad_request(format!(
            "Cannot delete user. User has {} tickets assigned to them. Please reassign or close these tickets first.",
            assigned
        )));
    }

    let created: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE created_by = $1")
        .bind(user_id)
        .fetch_one(&pool)
        .await?;
    if created > 0 {
        return Err(ApiError::bad_request(format!(
            "Cannot delete user. User has created {} tickets. Please reassign or close these tickets first.",
            created
        )));
    }

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&pool)
        .await?;

    tracing::info!(user = user_id, actor = actor.user_id, "user deleted");
    Ok(user.name)
}

/// Assignee picker data. Channel partners get role options; staff roles
/// get the eligible users with workload counts.
pub async fn list_assignees(actor: &AuthUser) -> Result<AssigneeListing, ApiError> {
    if !policy::capabilities(actor.role).can_view_assignees {
        return Err(ApiError::forbidden(
            "Access denied - Only channel partners, head office, technical, and assignee users can view assignees",
        ));
    }

    if actor.role == Role::ChannelPartner {
        return Ok(AssigneeListing::RoleOptions);
    }

    let pool = database::pool().await?;
    let rows = sqlx::query_as::<_, AssigneeRow>(
        "SELECT u.id, u.email, u.name, u.role, u.department, u.location, u.created_at, \
         (SELECT COUNT(*) FROM tickets t WHERE t.assigned_to = u.id) AS assigned_tickets, \
         (SELECT COUNT(*) FROM tickets t WHERE t.assigned_to = u.id AND t.status = 'in_progress') AS active_tickets \
         FROM users u \
         WHERE u.role IN ('assignee', 'technical', 'developer_support') \
         ORDER BY u.name ASC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(AssigneeListing::Users(rows))
}
