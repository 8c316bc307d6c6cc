use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Ticket joined with creator/assignee identity columns.
/// Every list and detail query selects this shape.
#[derive(Debug, Clone, FromRow)]
pub struct TicketRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: String,
    pub status: String,
    pub created_by: i64,
    pub assigned_to: Option<i64>,
    pub assigned_role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Option<String>,
    pub created_by_name: Option<String>,
    pub created_by_email: Option<String>,
    pub assigned_to_name: Option<String>,
    pub assigned_to_email: Option<String>,
}

/// Narrow projection for dashboard recent/overdue lists.
#[derive(Debug, Clone, FromRow)]
pub struct TicketSummaryRow {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub priority: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_by_name: Option<String>,
    pub assigned_to_name: Option<String>,
}
