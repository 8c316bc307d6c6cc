use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::database::{self, models::TicketRow};
use crate::error::ApiError;
use crate::filter::{bind_rows, PredicateBuilder, SqlParam};
use crate::middleware::AuthUser;
use crate::policy;

/// Which entity kinds a search request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEntity {
    All,
    Tickets,
    Users,
    Comments,
}

impl SearchEntity {
    pub fn parse(s: Option<&str>) -> SearchEntity {
        match s {
            Some("tickets") => SearchEntity::Tickets,
            Some("users") => SearchEntity::Users,
            Some("comments") => SearchEntity::Comments,
            _ => SearchEntity::All,
        }
    }

    fn covers(self, other: SearchEntity) -> bool {
        self == SearchEntity::All || self == other
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct UserSearchRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub ticket_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct CommentSearchRow {
    pub id: i64,
    pub ticket_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_internal: i32,
    pub ticket_title: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Default)]
pub struct SearchResults {
    pub tickets: Vec<TicketRow>,
    pub users: Vec<UserSearchRow>,
    pub comments: Vec<CommentSearchRow>,
}

impl SearchResults {
    pub fn total(&self) -> usize {
        self.tickets.len() + self.users.len() + self.comments.len()
    }
}

/// Multi-entity substring search. Tickets and comments stay inside the
/// caller's visibility scope; the users section only exists for roles
/// with the user-search capability.
pub async fn search_all(
    actor: &AuthUser,
    term: &str,
    entity: SearchEntity,
    limit: i64,
) -> Result<SearchResults, ApiError> {
    let term = term.trim();
    if term.is_empty() {
        return Ok(SearchResults::default());
    }

    let mut results = SearchResults::default();
    let pool = database::pool().await?;
    let scope = policy::ticket_scope(actor.role, actor.user_id);
    let pattern = format!("%{}%", term);

    if entity.covers(SearchEntity::Tickets) {
        let mut builder = PredicateBuilder::new().scope(scope);
        builder.search_term(term);
        let (sql, params) = builder.select_tickets(None, None, limit, 0);
        results.tickets = bind_rows(sqlx::query_as::<_, TicketRow>(&sql), &params)
            .fetch_all(&pool)
            .await?;
    }

    if entity.covers(SearchEntity::Users) && policy::capabilities(actor.role).can_search_users {
        let rows = sqlx::query_as::<_, UserSearchRow>(
            "SELECT u.id, u.email, u.name, u.role, u.department, u.location, u.created_at, \
             (SELECT COUNT(*) FROM tickets t WHERE t.assigned_to = u.id) AS ticket_count \
             FROM users u \
             WHERE (u.name ILIKE $1 OR u.email ILIKE $1 OR u.department ILIKE $1 OR u.location ILIKE $1) \
             ORDER BY u.name ASC LIMIT $2",
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&pool)
        .await?;
        results.users = rows;
    }

    if entity.covers(SearchEntity::Comments) {
        let (scope_where, mut params) = PredicateBuilder::new().scope(scope).parts();
        // Re-anchor the scope predicate behind the content match
        let scope_and = scope_where.replacen("WHERE", "AND", 1);

        params.push(SqlParam::Text(pattern.clone()));
        let content_idx = params.len();
        params.push(SqlParam::Int(limit));
        let limit_idx = params.len();

        let sql = format!(
            "SELECT c.id, c.ticket_id, c.user_id, c.content, c.created_at, c.is_internal, \
             t.title AS ticket_title, u.name AS user_name, u.email AS user_email \
             FROM ticket_comments c \
             LEFT JOIN tickets t ON c.ticket_id = t.id \
             LEFT JOIN users u ON c.user_id = u.id \
             WHERE c.content ILIKE ${} {} \
             ORDER BY c.created_at DESC LIMIT ${}",
            content_idx, scope_and, limit_idx
        );
        results.comments = bind_rows(sqlx::query_as::<_, CommentSearchRow>(&sql), &params)
            .fetch_all(&pool)
            .await?;
    }

    Ok(results)
}
