use sqlx::FromRow;

use crate::database::{self, models::{TicketSummaryRow, UserRow}};
use crate::error::ApiError;
use crate::filter::{bind_rows, PredicateBuilder, SqlParam};
use crate::middleware::AuthUser;
use crate::policy;

use super::user_service;

/// Scoped ticket counters. Everything is computed by the database in one
/// grouped pass; rows are never loaded and counted in application memory.
#[derive(Debug, Clone, FromRow)]
pub struct OverallStatsRow {
    pub total_tickets: i64,
    pub open_tickets: i64,
    pub in_progress_tickets: i64,
    pub pending_approval_tickets: i64,
    pub resolved_tickets: i64,
    pub closed_tickets: i64,
    pub urgent_tickets: i64,
    pub high_priority_tickets: i64,
    pub medium_priority_tickets: i64,
    pub low_priority_tickets: i64,
    pub assigned_to_me: i64,
    pub created_by_me: i64,
    pub overdue_tickets: i64,
}

/// Per-category or per-priority status breakdown.
#[derive(Debug, Clone, FromRow)]
pub struct BreakdownRow {
    pub label: String,
    pub total: i64,
    pub open: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub closed: i64,
}

pub struct DashboardData {
    pub user: UserRow,
    pub stats: OverallStatsRow,
    pub category_breakdown: Vec<BreakdownRow>,
    pub priority_breakdown: Vec<BreakdownRow>,
    pub recent_tickets: Vec<TicketSummaryRow>,
    pub overdue_tickets: Vec<TicketSummaryRow>,
    pub avg_resolution_days: f64,
}

const SUMMARY_SELECT: &str = "SELECT t.id, t.title, t.status, t.priority, t.category, t.created_at, t.due_date, \
     u1.name AS created_by_name, u2.name AS assigned_to_name \
     FROM tickets t \
     LEFT JOIN users u1 ON t.created_by = u1.id \
     LEFT JOIN users u2 ON t.assigned_to = u2.id";

/// Everything the dashboard endpoints need, computed within the caller's
/// visibility scope.
pub async fn dashboard_data(actor: &AuthUser) -> Result<DashboardData, ApiError> {
    let user = user_service::me(actor.user_id).await?;
    let pool = database::pool().await?;

    let scope = policy::ticket_scope(actor.role, actor.user_id);
    let (where_clause, params) = PredicateBuilder::new().scope(scope).into_parts();

    let mut stats_params = params.clone();
    stats_params.push(SqlParam::Int(actor.user_id));
    let assigned_idx = stats_params.len();
    stats_params.push(SqlParam::Int(actor.user_id));
    let created_idx = stats_params.len();

    let stats_sql = format!(
        "SELECT COUNT(*) AS total_tickets, \
         COALESCE(SUM(CASE WHEN t.status = 'open' THEN 1 ELSE 0 END), 0) AS open_tickets, \
         COALESCE(SUM(CASE WHEN t.status = 'in_progress' THEN 1 ELSE 0 END), 0) AS in_progress_tickets, \
         COALESCE(SUM(CASE WHEN t.status = 'pending_approval' THEN 1 ELSE 0 END), 0) AS pending_approval_tickets, \
         COALESCE(SUM(CASE WHEN t.status = 'resolved' THEN 1 ELSE 0 END), 0) AS resolved_tickets, \
         COALESCE(SUM(CASE WHEN t.status = 'closed' THEN 1 ELSE 0 END), 0) AS closed_tickets, \
         COALESCE(SUM(CASE WHEN t.priority = 'urgent' THEN 1 ELSE 0 END), 0) AS urgent_tickets, \
         COALESCE(SUM(CASE WHEN t.priority = 'high' THEN 1 ELSE 0 END), 0) AS high_priority_tickets, \
         COALESCE(SUM(CASE WHEN t.priority = 'medium' THEN 1 ELSE 0 END), 0) AS medium_priority_tickets, \
         COALESCE(SUM(CASE WHEN t.priority = 'low' THEN 1 ELSE 0 END), 0) AS low_priority_tickets, \
         COALESCE(SUM(CASE WHEN t.assigned_to = ${} THEN 1 ELSE 0 END), 0) AS assigned_to_me, \
         COALESCE(SUM(CASE WHEN t.created_by = ${} THEN 1 ELSE 0 END), 0) AS created_by_me, \
         COALESCE(SUM(CASE WHEN t.due_date IS NOT NULL AND t.due_date < now() AND t.status NOT IN ('resolved', 'closed') THEN 1 ELSE 0 END), 0) AS overdue_tickets \
         FROM tickets t {}",
        assigned_idx, created_idx, where_clause
    );
    let stats = bind_rows(sqlx::query_as::<_, OverallStatsRow>(&stats_sql), &stats_params)
        .fetch_one(&pool)
        .await?;

    let category_sql = format!(
        "SELECT t.category AS label, COUNT(*) AS total, \
         COALESCE(SUM(CASE WHEN t.status = 'open' THEN 1 ELSE 0 END), 0) AS open, \
         COALESCE(SUM(CASE WHEN t.status = 'in_progress' THEN 1 ELSE 0 END), 0) AS in_progress, \
         COALESCE(SUM(CASE WHEN t.status = 'resolved' THEN 1 ELSE 0 END), 0) AS resolved, \
         COALESCE(SUM(CASE WHEN t.status = 'closed' THEN 1 ELSE 0 END), 0) AS closed \
         FROM tickets t {} GROUP BY t.category ORDER BY total DESC",
        where_clause
    );
    let category_breakdown = bind_rows(sqlx::query_as::<_, BreakdownRow>(&category_sql), &params)
        .fetch_all(&pool)
        .await?;

    let priority_sql = format!(
        "SELECT t.priority AS label, COUNT(*) AS total, \
         COALESCE(SUM(CASE WHEN t.status = 'open' THEN 1 ELSE 0 END), 0) AS open, \
         COALESCE(SUM(CASE WHEN t.status = 'in_progress' THEN 1 ELSE 0 END), 0) AS in_progress, \
         COALESCE(SUM(CASE WHEN t.status = 'resolved' THEN 1 ELSE 0 END), 0) AS resolved, \
         COALESCE(SUM(CASE WHEN t.status = 'closed' THEN 1 ELSE 0 END), 0) AS closed \
         FROM tickets t {} GROUP BY t.priority \
         ORDER BY CASE t.priority WHEN 'urgent' THEN 1 WHEN 'high' THEN 2 WHEN 'medium' THEN 3 WHEN 'low' THEN 4 END",
        where_clause
    );
    let priority_breakdown = bind_rows(sqlx::query_as::<_, BreakdownRow>(&priority_sql), &params)
        .fetch_all(&pool)
        .await?;

    let recent_sql = format!(
        "{} {} AND t.created_at >= now() - interval '7 days' \
         ORDER BY t.created_at DESC LIMIT 10",
        SUMMARY_SELECT, where_clause
    );
    let recent_tickets = bind_rows(sqlx::query_as::<_, TicketSummaryRow>(&recent_sql), &params)
        .fetch_all(&pool)
        .await?;

    let overdue_sql = format!(
        "{} {} AND t.due_date IS NOT NULL AND t.due_date < now() \
         AND t.status NOT IN ('resolved', 'closed') \
         ORDER BY t.due_date ASC LIMIT 10",
        SUMMARY_SELECT, where_clause
    );
    let overdue_tickets = bind_rows(sqlx::query_as::<_, TicketSummaryRow>(&overdue_sql), &params)
        .fetch_all(&pool)
        .await?;

    let avg_sql = format!(
        "SELECT COALESCE(AVG(EXTRACT(EPOCH FROM (t.updated_at - t.created_at)) / 86400.0), 0)::float8 \
         FROM tickets t {} AND t.status IN ('resolved', 'closed')",
        where_clause
    );
    let avg_resolution_days: f64 =
        crate::filter::bind_scalar(sqlx::query_scalar(&avg_sql), &params)
            .fetch_one(&pool)
            .await?;

    Ok(DashboardData {
        user,
        stats,
        category_breakdown,
        priority_breakdown,
        recent_tickets,
        overdue_tickets,
        avg_resolution_days,
    })
}
