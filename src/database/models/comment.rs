use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Comment joined with author identity columns.
#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub ticket_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_internal: i32,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// Internal comments joined with author identity, used for transfer history.
#[derive(Debug, Clone, FromRow)]
pub struct TransferHistoryRow {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_role: Option<String>,
}
