use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub is_active: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
