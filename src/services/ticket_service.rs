use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::FromRow;

use crate::api::format::join_tags;
use crate::database::{self, models::{CommentRow, TicketRow, TransferHistoryRow, UserRow}};
use crate::error::ApiError;
use crate::filter::types::IdValue;
use crate::filter::{bind_exec, bind_rows, bind_scalar, priority_rank_order, PredicateBuilder, SqlParam, TicketFilter};
use crate::middleware::AuthUser;
use crate::policy::{self, guard, TicketAction, TicketFacts};
use crate::types::{Assignment, Role, TicketCategory, TicketPriority, TicketStatus};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<IdValue>,
    pub due_date: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateTicketRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    #[serde(deserialize_with = "super::explicit")]
    pub assigned_to: Option<Option<IdValue>>,
    #[serde(deserialize_with = "super::explicit")]
    pub due_date: Option<Option<String>>,
    #[serde(deserialize_with = "super::explicit")]
    pub tags: Option<Option<Vec<String>>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListTicketsQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<i64>,
    pub created_by: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MyTicketsQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    /// created | assigned | available
    pub r#type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub ticket_id: Option<IdValue>,
    pub assignee_id: Option<IdValue>,
}

/// Per-view counters returned next to the my-tickets list.
#[derive(Debug, FromRow)]
pub struct MyTicketStats {
    pub total: i64,
    pub open_count: i64,
    pub in_progress_count: i64,
    pub pending_count: i64,
    pub resolved_count: i64,
    pub closed_count: i64,
    pub urgent_count: i64,
    pub high_count: i64,
    pub assigned_to_me: i64,
    pub created_by_me: i64,
}

pub struct TransferOutcome {
    pub ticket: TicketRow,
    pub assignee: UserRow,
    pub previously_assigned: bool,
}

#[derive(Debug, FromRow)]
struct FactsRow {
    created_by: i64,
    assigned_to: Option<i64>,
    status: String,
}

impl FactsRow {
    fn facts(&self) -> Result<TicketFacts, ApiError> {
        let status = parse_db_status(&self.status)?;
        Ok(TicketFacts {
            created_by: self.created_by,
            assigned_to: self.assigned_to,
            status,
        })
    }
}

/// A status outside the enum can only mean a corrupted row; surface it as
/// a server fault, not a client error.
fn parse_db_status(status: &str) -> Result<TicketStatus, ApiError> {
    TicketStatus::parse(status).ok_or_else(|| {
        tracing::error!("unexpected ticket status in database: {}", status);
        ApiError::internal_server_error("Internal server error")
    })
}

fn parse_due_date(value: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
        .ok_or_else(|| ApiError::validation_error("Invalid due date format"))
}

fn assignable_roles_in_sql() -> String {
    policy::ASSIGNABLE_ROLES
        .map(|r| format!("'{}'", r.as_str()))
        .join(", ")
}

async fn fetch_facts(ticket_id: i64) -> Result<TicketFacts, ApiError> {
    let pool = database::pool().await?;
    let row = sqlx::query_as::<_, FactsRow>(
        "SELECT created_by, assigned_to, status FROM tickets WHERE id = $1",
    )
    .bind(ticket_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Ticket not found"))?;
    row.facts()
}

/// Fetch a single ticket with creator/assignee identity joined in.
pub async fn fetch_ticket(ticket_id: i64) -> Result<TicketRow, ApiError> {
    let pool = database::pool().await?;
    let sql = format!("{} WHERE t.id = $1", crate::filter::predicate::TICKET_SELECT);
    sqlx::query_as::<_, TicketRow>(&sql)
        .bind(ticket_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Ticket not found"))
}

async fn ensure_assignable_user(user_id: i64) -> Result<UserRow, ApiError> {
    let pool = database::pool().await?;
    let sql = format!(
        "SELECT * FROM users WHERE id = $1 AND role IN ({})",
        assignable_roles_in_sql()
    );
    sqlx::query_as::<_, UserRow>(&sql)
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| {
            ApiError::validation_error(format!(
                "Invalid assignee. User must exist and have one of: {}",
                policy::assignable_roles_list()
            ))
        })
}

/// Resolve the requested assignment for a new ticket. Channel partners
/// route to a role; everyone else names a concrete eligible user.
async fn resolve_create_assignment(
    actor: &AuthUser,
    requested: Option<&IdValue>,
) -> Result<Assignment, ApiError> {
    let Some(requested) = requested else {
        return Ok(Assignment::Unassigned);
    };

    if actor.role == Role::ChannelPartner {
        let name = match requested {
            IdValue::Text(s) => s.as_str(),
            IdValue::Int(_) => "",
        };
        return match Role::parse(name) {
            Some(role) if policy::PARTNER_ROUTING_ROLES.contains(&role) => {
                Ok(Assignment::ToRole(role))
            }
            _ => Err(ApiError::validation_error(
                "Invalid assignee role. Channel partners can only assign to technical or assignee roles",
            )),
        };
    }

    let user_id = requested
        .as_i64()
        .map_err(|e| ApiError::validation_error(e.to_string()))?;
    ensure_assignable_user(user_id).await?;
    Ok(Assignment::User(user_id))
}

pub async fn create_ticket(
    actor: &AuthUser,
    request: CreateTicketRequest,
) -> Result<TicketRow, ApiError> {
    if !policy::capabilities(actor.role).can_create_ticket {
        return Err(ApiError::forbidden(
            "Access denied - Your role cannot create tickets",
        ));
    }

    let (title, description, category, priority) = match (
        request.title.as_deref().filter(|s| !s.trim().is_empty()),
        request.description.as_deref().filter(|s| !s.trim().is_empty()),
        request.category.as_deref(),
        request.priority.as_deref(),
    ) {
        (Some(t), Some(d), Some(c), Some(p)) => (t, d, c, p),
        _ => {
            return Err(ApiError::validation_error(
                "Missing required fields: title, description, category, priority",
            ))
        }
    };

    let category = TicketCategory::parse(category).ok_or_else(|| {
        ApiError::validation_error(format!(
            "Invalid category. Must be one of: {}",
            TicketCategory::expected_list()
        ))
    })?;
    let priority = TicketPriority::parse(priority).ok_or_else(|| {
        ApiError::validation_error(format!(
            "Invalid priority. Must be one of: {}",
            TicketPriority::expected_list()
        ))
    })?;

    let assignment = resolve_create_assignment(actor, request.assigned_to.as_ref()).await?;
    let due_date = match request.due_date.as_deref() {
        Some(value) if !value.is_empty() => Some(parse_due_date(value)?),
        _ => None,
    };
    let tags = request.tags.as_deref().and_then(|t| join_tags(t));

    let (assigned_to, assigned_role) = assignment.to_columns();

    let pool = database::pool().await?;
    let (ticket_id,): (i64,) = sqlx::query_as(
        "INSERT INTO tickets (title, description, category, priority, status, created_by, assigned_to, assigned_role, due_date, tags) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
    )
    .bind(title)
    .bind(description)
    .bind(category.as_str())
    .bind(priority.as_str())
    .bind(TicketStatus::Open.as_str())
    .bind(actor.user_id)
    .bind(assigned_to)
    .bind(assigned_role)
    .bind(due_date)
    .bind(tags)
    .fetch_one(&pool)
    .await?;

    tracing::info!(
        ticket = ticket_id,
        actor = actor.user_id,
        "ticket created"
    );

    fetch_ticket(ticket_id).await
}

/// Scoped ticket listing with optional single-value equality filters.
pub async fn list_tickets(
    actor: &AuthUser,
    query: &ListTicketsQuery,
) -> Result<Vec<TicketRow>, ApiError> {
    let mut builder =
        PredicateBuilder::new().scope(policy::ticket_scope(actor.role, actor.user_id));

    if let Some(status) = query.status.as_deref() {
        builder.eq_text("t.status", status);
    }
    if let Some(category) = query.category.as_deref() {
        builder.eq_text("t.category", category);
    }
    if let Some(priority) = query.priority.as_deref() {
        builder.eq_text("t.priority", priority);
    }
    if let Some(assigned_to) = query.assigned_to {
        builder.eq_int("t.assigned_to", assigned_to);
    }
    if let Some(created_by) = query.created_by {
        builder.eq_int("t.created_by", created_by);
    }

    let (sql, params) = builder.select_tickets_ordered("ORDER BY t.created_at DESC");
    let pool = database::pool().await?;
    let rows = bind_rows(sqlx::query_as::<_, TicketRow>(&sql), &params)
        .fetch_all(&pool)
        .await?;
    Ok(rows)
}

/// Full structured filtering with pagination, shared by the filter and
/// ticket-search endpoints.
pub async fn filter_tickets(
    actor: &AuthUser,
    filter: &TicketFilter,
    default_limit: i64,
) -> Result<(Vec<TicketRow>, i64, i64, i64), ApiError> {
    let (limit, offset) = filter.page(default_limit)?;

    let builder = PredicateBuilder::new()
        .scope(policy::ticket_scope(actor.role, actor.user_id))
        .apply(filter)?;

    let pool = database::pool().await?;

    let (count_sql, count_params) = builder.count_tickets();
    let total: i64 = bind_scalar(sqlx::query_scalar(&count_sql), &count_params)
        .fetch_one(&pool)
        .await?;

    let (sql, params) = builder.select_tickets(
        filter.sort_by.as_deref(),
        filter.sort_order.as_deref(),
        limit,
        offset,
    );
    let rows = bind_rows(sqlx::query_as::<_, TicketRow>(&sql), &params)
        .fetch_all(&pool)
        .await?;

    Ok((rows, total, limit, offset))
}

/// Distinct filter option values visible within the caller's scope.
pub async fn filter_options(actor: &AuthUser) -> Result<serde_json::Value, ApiError> {
    let pool = database::pool().await?;
    let scope = policy::ticket_scope(actor.role, actor.user_id);

    let (where_clause, params) = PredicateBuilder::new().scope(scope).into_parts();

    let distinct = |column: &str| -> (String, Vec<SqlParam>) {
        (
            format!(
                "SELECT DISTINCT t.{} FROM tickets t {} ORDER BY t.{}",
                column, where_clause, column
            ),
            params.clone(),
        )
    };

    let (status_sql, status_params) = distinct("status");
    let statuses: Vec<String> = bind_scalar(sqlx::query_scalar(&status_sql), &status_params)
        .fetch_all(&pool)
        .await?;

    let (priority_sql, priority_params) = distinct("priority");
    let priorities: Vec<String> = bind_scalar(sqlx::query_scalar(&priority_sql), &priority_params)
        .fetch_all(&pool)
        .await?;

    let (category_sql, category_params) = distinct("category");
    let categories: Vec<String> = bind_scalar(sqlx::query_scalar(&category_sql), &category_params)
        .fetch_all(&pool)
        .await?;

    let assignee_sql = format!(
        "SELECT DISTINCT u.id, u.name, u.email, u.role, u.department \
         FROM users u INNER JOIN tickets t ON u.id = t.assigned_to {}",
        where_clause
    );
    let assignees: Vec<PickerUserRow> =
        bind_rows(sqlx::query_as(&assignee_sql), &params).fetch_all(&pool).await?;

    let creator_sql = format!(
        "SELECT DISTINCT u.id, u.name, u.email, u.role, u.department \
         FROM users u INNER JOIN tickets t ON u.id = t.created_by {}",
        where_clause
    );
    let creators: Vec<PickerUserRow> =
        bind_rows(sqlx::query_as(&creator_sql), &params).fetch_all(&pool).await?;

    let tags_sql = format!(
        "SELECT t.tags FROM tickets t {} AND t.tags IS NOT NULL AND t.tags <> ''",
        where_clause
    );
    let tag_rows: Vec<String> = bind_scalar(sqlx::query_scalar(&tags_sql), &params)
        .fetch_all(&pool)
        .await?;
    let mut tags: Vec<String> = tag_rows
        .iter()
        .flat_map(|row| row.split(','))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    tags.sort();
    tags.dedup();

    Ok(serde_json::json!({
        "statuses": statuses,
        "priorities": priorities,
        "categories": categories,
        "assignees": assignees.iter().map(PickerUserRow::to_json).collect::<Vec<_>>(),
        "creators": creators.iter().map(PickerUserRow::to_json).collect::<Vec<_>>(),
        "tags": tags,
    }))
}

#[derive(Debug, FromRow)]
struct PickerUserRow {
    id: i64,
    name: String,
    email: String,
    role: String,
    department: Option<String>,
}

impl PickerUserRow {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id.to_string(),
            "name": self.name,
            "email": self.email,
            "role": self.role,
            "department": self.department,
        })
    }
}

/// Guard-checked single ticket read, including its comment thread.
pub async fn get_ticket(
    actor: &AuthUser,
    ticket_id: i64,
) -> Result<(TicketRow, Vec<CommentRow>), ApiError> {
    let ticket = fetch_ticket(ticket_id).await?;
    let facts = TicketFacts {
        created_by: ticket.created_by,
        assigned_to: ticket.assigned_to,
        status: parse_db_status(&ticket.status)?,
    };
    if !guard::allows(actor.role, actor.user_id, facts, TicketAction::View) {
        return Err(ApiError::forbidden("Access denied"));
    }

    let comments = fetch_comments(ticket_id).await?;
    Ok((ticket, comments))
}

async fn fetch_comments(ticket_id: i64) -> Result<Vec<CommentRow>, ApiError> {
    let pool = database::pool().await?;
    let rows = sqlx::query_as::<_, CommentRow>(
        "SELECT c.id, c.ticket_id, c.user_id, c.content, c.created_at, c.is_internal, \
         u.name AS user_name, u.email AS user_email \
         FROM ticket_comments c LEFT JOIN users u ON c.user_id = u.id \
         WHERE c.ticket_id = $1 ORDER BY c.created_at ASC",
    )
    .bind(ticket_id)
    .fetch_all(&pool)
    .await?;
    Ok(rows)
}

pub async fn update_ticket(
    actor: &AuthUser,
    ticket_id: i64,
    request: UpdateTicketRequest,
) -> Result<TicketRow, ApiError> {
    let facts = fetch_facts(ticket_id).await?;
    if !guard::allows(actor.role, actor.user_id, facts, TicketAction::Edit) {
        return Err(ApiError::forbidden("Access denied"));
    }

    let mut sets: Vec<String> = Vec::new();
    let mut params: Vec<SqlParam> = Vec::new();

    if let Some(title) = request.title.as_deref() {
        params.push(SqlParam::Text(title.to_string()));
        sets.push(format!("title = ${}", params.len()));
    }
    if let Some(description) = request.description.as_deref() {
        params.push(SqlParam::Text(description.to_string()));
        sets.push(format!("description = ${}", params.len()));
    }
    if let Some(category) = request.category.as_deref() {
        let category = TicketCategory::parse(category).ok_or_else(|| {
            ApiError::validation_error(format!(
                "Invalid category. Must be one of: {}",
                TicketCategory::expected_list()
            ))
        })?;
        params.push(SqlParam::Text(category.as_str().to_string()));
        sets.push(format!("category = ${}", params.len()));
    }
    if let Some(priority) = request.priority.as_deref() {
        let priority = TicketPriority::parse(priority).ok_or_else(|| {
            ApiError::validation_error(format!(
                "Invalid priority. Must be one of: {}",
                TicketPriority::expected_list()
            ))
        })?;
        params.push(SqlParam::Text(priority.as_str().to_string()));
        sets.push(format!("priority = ${}", params.len()));
    }

    let mut new_status: Option<TicketStatus> = None;
    if let Some(status) = request.status.as_deref() {
        let status = TicketStatus::parse(status).ok_or_else(|| {
            ApiError::validation_error(format!(
                "Invalid status. Must be one of: {}",
                TicketStatus::expected_list()
            ))
        })?;
        new_status = Some(status);
        params.push(SqlParam::Text(status.as_str().to_string()));
        sets.push(format!("status = ${}", params.len()));
    }

    if let Some(requested) = request.assigned_to.as_ref() {
        let assignment = match requested {
            None => Assignment::Unassigned,
            Some(value) => {
                let user_id = value
                    .as_i64()
                    .map_err(|e| ApiError::validation_error(e.to_string()))?;
                ensure_assignable_user(user_id).await?;
                Assignment::User(user_id)
            }
        };
        let (assigned_to, assigned_role) = assignment.to_columns();
        match assigned_to {
            Some(id) => {
                params.push(SqlParam::Int(id));
                sets.push(format!("assigned_to = ${}", params.len()));
            }
            None => sets.push("assigned_to = NULL".to_string()),
        }
        match assigned_role {
            Some(role) => {
                params.push(SqlParam::Text(role.to_string()));
                sets.push(format!("assigned_role = ${}", params.len()));
            }
            None => sets.push("assigned_role = NULL".to_string()),
        }
    }

    if let Some(due_date) = request.due_date.as_ref() {
        match due_date.as_deref().filter(|s| !s.is_empty()) {
            Some(value) => {
                let parsed = parse_due_date(value)?;
                params.push(SqlParam::Timestamp(parsed));
                sets.push(format!("due_date = ${}", params.len()));
            }
            None => sets.push("due_date = NULL".to_string()),
        }
    }

    if let Some(tags) = request.tags.as_ref() {
        match tags.as_deref().and_then(join_tags) {
            Some(joined) => {
                params.push(SqlParam::Text(joined));
                sets.push(format!("tags = ${}", params.len()));
            }
            None => sets.push("tags = NULL".to_string()),
        }
    }

    if sets.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    sets.push("updated_at = now()".to_string());
    params.push(SqlParam::Int(ticket_id));
    let sql = format!(
        "UPDATE tickets SET {} WHERE id = ${}",
        sets.join(", "),
        params.len()
    );

    let pool = database::pool().await?;
    bind_exec(sqlx::query(&sql), &params).execute(&pool).await?;

    // Transitions are free-form; the audit trail is the log line.
    if let Some(status) = new_status {
        if status != facts.status {
            tracing::info!(
                ticket = ticket_id,
                actor = actor.user_id,
                from = facts.status.as_str(),
                to = status.as_str(),
                "ticket status changed"
            );
        }
    }

    fetch_ticket(ticket_id).await
}

pub async fn delete_ticket(actor: &AuthUser, ticket_id: i64) -> Result<(), ApiError> {
    // Existence first so a missing ticket reads as 404, not 403
    fetch_facts(ticket_id).await?;

    if !policy::capabilities(actor.role).can_delete_ticket {
        return Err(ApiError::forbidden(
            "Access denied - Only head office and technical users can delete tickets",
        ));
    }

    let pool = database::pool().await?;
    sqlx::query("DELETE FROM tickets WHERE id = $1")
        .bind(ticket_id)
        .execute(&pool)
        .await?;

    tracing::info!(ticket = ticket_id, actor = actor.user_id, "ticket deleted");
    Ok(())
}

pub async fn list_comments(actor: &AuthUser, ticket_id: i64) -> Result<Vec<CommentRow>, ApiError> {
    let facts = fetch_facts(ticket_id).await?;
    if !guard::allows(actor.role, actor.user_id, facts, TicketAction::Comment) {
        return Err(ApiError::forbidden("Access denied"));
    }
    fetch_comments(ticket_id).await
}

pub async fn add_comment(
    actor: &AuthUser,
    ticket_id: i64,
    content: &str,
    is_internal: bool,
) -> Result<CommentRow, ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::validation_error("Comment content is required"));
    }

    let facts = fetch_facts(ticket_id).await?;
    if !guard::allows(actor.role, actor.user_id, facts, TicketAction::Comment) {
        return Err(ApiError::forbidden("Access denied"));
    }

    let pool = database::pool().await?;
    let mut tx = pool.begin().await?;

    let (comment_id,): (i64,) = sqlx::query_as(
        "INSERT INTO ticket_comments (ticket_id, user_id, content, is_internal) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(ticket_id)
    .bind(actor.user_id)
    .bind(content.trim())
    .bind(if is_internal { 1i32 } else { 0i32 })
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE tickets SET updated_at = now() WHERE id = $1")
        .bind(ticket_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let row = sqlx::query_as::<_, CommentRow>(
        "SELECT c.id, c.ticket_id, c.user_id, c.content, c.created_at, c.is_internal, \
         u.name AS user_name, u.email AS user_email \
         FROM ticket_comments c LEFT JOIN users u ON c.user_id = u.id \
         WHERE c.id = $1",
    )
    .bind(comment_id)
    .fetch_one(&pool)
    .await?;
    Ok(row)
}

/// Reassign a ticket. Runs in a transaction: the update is conditional on
/// the assignee observed at read time, so two simultaneous transfers of
/// the same ticket cannot both win; the loser gets a conflict instead of
/// silently overwriting.
pub async fn transfer_ticket(
    actor: &AuthUser,
    request: TransferRequest,
) -> Result<TransferOutcome, ApiError> {
    let (ticket_id, assignee_id) = match (request.ticket_id.as_ref(), request.assignee_id.as_ref())
    {
        (Some(t), Some(a)) => (
            t.as_i64().map_err(|e| ApiError::validation_error(e.to_string()))?,
            a.as_i64().map_err(|e| ApiError::validation_error(e.to_string()))?,
        ),
        _ => {
            return Err(ApiError::validation_error(
                "Missing required fields: ticketId and assigneeId",
            ))
        }
    };

    let ticket = fetch_ticket(ticket_id).await?;
    let facts = TicketFacts {
        created_by: ticket.created_by,
        assigned_to: ticket.assigned_to,
        status: parse_db_status(&ticket.status)?,
    };

    if !guard::allows(actor.role, actor.user_id, facts, TicketAction::Transfer) {
        return Err(ApiError::forbidden(
            "Access denied - Channel partners can only transfer tickets they created or are assigned to",
        ));
    }

    let assignee = ensure_assignable_user(assignee_id).await.map_err(|e| match e {
        ApiError::ValidationError(_) => ApiError::validation_error(
            "Invalid assignee - User not found or does not have assignee/technical/developer_support/head_office role",
        ),
        other => other,
    })?;

    let previously_assigned = ticket.assigned_to.is_some();
    let transfer_reason = match actor.role {
        Role::HeadOffice | Role::Technical => "admin/technical user",
        Role::Assignee => "assignee user",
        _ => {
            if ticket.created_by == actor.user_id {
                "created ticket"
            } else {
                "assigned ticket"
            }
        }
    };

    let pool = database::pool().await?;
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE tickets \
         SET assigned_to = $1, \
             assigned_role = NULL, \
             updated_at = now(), \
             status = CASE WHEN status = 'open' THEN 'in_progress' ELSE status END \
         WHERE id = $2 AND assigned_to IS NOT DISTINCT FROM $3",
    )
    .bind(assignee_id)
    .bind(ticket_id)
    .bind(ticket.assigned_to)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(ApiError::conflict(
            "Ticket was reassigned by someone else, please retry",
        ));
    }

    let verb = if previously_assigned { "transferred" } else { "assigned" };
    let comment = format!(
        "Ticket {} to {} ({}) by {} ({}).",
        verb,
        assignee.name,
        assignee.department.as_deref().unwrap_or("Support"),
        actor.name,
        transfer_reason
    );

    sqlx::query(
        "INSERT INTO ticket_comments (ticket_id, user_id, content, is_internal) \
         VALUES ($1, $2, $3, 1)",
    )
    .bind(ticket_id)
    .bind(actor.user_id)
    .bind(&comment)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        ticket = ticket_id,
        actor = actor.user_id,
        from = ?ticket.assigned_to,
        to = assignee_id,
        "ticket reassigned"
    );

    let updated = fetch_ticket(ticket_id).await?;
    Ok(TransferOutcome {
        ticket: updated,
        assignee,
        previously_assigned,
    })
}

pub async fn transfer_history(
    actor: &AuthUser,
    ticket_id: i64,
) -> Result<Vec<TransferHistoryRow>, ApiError> {
    let facts = fetch_facts(ticket_id).await?;
    if !guard::allows(actor.role, actor.user_id, facts, TicketAction::View) {
        return Err(ApiError::forbidden(
            "Access denied - You do not have permission to view this ticket",
        ));
    }

    let pool = database::pool().await?;
    let rows = sqlx::query_as::<_, TransferHistoryRow>(
        "SELECT c.id, c.user_id, c.content, c.created_at, \
         u.name AS user_name, u.role AS user_role \
         FROM ticket_comments c JOIN users u ON c.user_id = u.id \
         WHERE c.ticket_id = $1 AND c.is_internal = 1 \
         ORDER BY c.created_at DESC",
    )
    .bind(ticket_id)
    .fetch_all(&pool)
    .await?;
    Ok(rows)
}

/// The role-relationship listing behind the my-tickets view, with its
/// per-view counters.
pub async fn my_tickets(
    actor: &AuthUser,
    query: &MyTicketsQuery,
) -> Result<(Vec<TicketRow>, MyTicketStats), ApiError> {
    let view = query.r#type.as_deref();
    let mut builder = PredicateBuilder::new();

    match actor.role {
        Role::ChannelPartner => builder.eq_int("t.created_by", actor.user_id),
        Role::Assignee => match view {
            Some("assigned") => builder.eq_int("t.assigned_to", actor.user_id),
            Some("available") => builder.unclaimed_open(),
            _ => builder.assigned_or_unclaimed_open(actor.user_id),
        },
        Role::HeadOffice | Role::Technical => match view {
            Some("created") => builder.eq_int("t.created_by", actor.user_id),
            Some("assigned") => builder.eq_int("t.assigned_to", actor.user_id),
            _ => {}
        },
        Role::DeveloperSupport => {
            builder = builder.scope(policy::ticket_scope(actor.role, actor.user_id));
        }
    }

    if let Some(status) = query.status.as_deref() {
        builder.eq_text("t.status", status);
    }
    if let Some(category) = query.category.as_deref() {
        builder.eq_text("t.category", category);
    }
    if let Some(priority) = query.priority.as_deref() {
        builder.eq_text("t.priority", priority);
    }

    let pool = database::pool().await?;

    let (where_clause, where_params) = builder.parts();

    let mut stats_params = where_params.clone();
    stats_params.push(SqlParam::Int(actor.user_id));
    let assigned_idx = stats_params.len();
    stats_params.push(SqlParam::Int(actor.user_id));
    let created_idx = stats_params.len();

    let stats_sql = format!(
        "SELECT COUNT(*) AS total, \
         COALESCE(SUM(CASE WHEN t.status = 'open' THEN 1 ELSE 0 END), 0) AS open_count, \
         COALESCE(SUM(CASE WHEN t.status = 'in_progress' THEN 1 ELSE 0 END), 0) AS in_progress_count, \
         COALESCE(SUM(CASE WHEN t.status = 'pending_approval' THEN 1 ELSE 0 END), 0) AS pending_count, \
         COALESCE(SUM(CASE WHEN t.status = 'resolved' THEN 1 ELSE 0 END), 0) AS resolved_count, \
         COALESCE(SUM(CASE WHEN t.status = 'closed' THEN 1 ELSE 0 END), 0) AS closed_count, \
         COALESCE(SUM(CASE WHEN t.priority = 'urgent' THEN 1 ELSE 0 END), 0) AS urgent_count, \
         COALESCE(SUM(CASE WHEN t.priority = 'high' THEN 1 ELSE 0 END), 0) AS high_count, \
         COALESCE(SUM(CASE WHEN t.assigned_to = ${} THEN 1 ELSE 0 END), 0) AS assigned_to_me, \
         COALESCE(SUM(CASE WHEN t.created_by = ${} THEN 1 ELSE 0 END), 0) AS created_by_me \
         FROM tickets t LEFT JOIN users u1 ON t.created_by = u1.id \
         LEFT JOIN users u2 ON t.assigned_to = u2.id {}",
        assigned_idx, created_idx, where_clause
    );
    let stats = bind_rows(sqlx::query_as::<_, MyTicketStats>(&stats_sql), &stats_params)
        .fetch_one(&pool)
        .await?;

    let (sql, params) = builder.select_tickets_ordered(priority_rank_order());
    let rows = bind_rows(sqlx::query_as::<_, TicketRow>(&sql), &params)
        .fetch_all(&pool)
        .await?;

    Ok((rows, stats))
}
