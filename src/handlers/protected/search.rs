use axum::{extract::Query, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::format::tickets_to_dtos;
use crate::config;
use crate::error::ApiError;
use crate::filter::types::{DateRange, IdValue, TicketFilter};
use crate::middleware::AuthUser;
use crate::services::search_service::{self, SearchEntity};
use crate::services::ticket_service;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub entity: Option<String>,
    pub limit: Option<i64>,
}

/// GET /search?q=&entity= - substring search across tickets, users, comments
pub async fn search_get(
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let term = query.q.unwrap_or_default();
    let entity = SearchEntity::parse(query.entity.as_deref());
    let default_limit = config::config().pagination.search_limit;
    let max_limit = config::config().pagination.max_limit;
    let limit = query.limit.unwrap_or(default_limit).clamp(1, max_limit);

    let results = search_service::search_all(&user, &term, entity, limit).await?;

    let tickets: Vec<Value> = tickets_to_dtos(&results.tickets)
        .into_iter()
        .map(|dto| {
            let mut value = serde_json::to_value(dto).unwrap_or(Value::Null);
            if let Some(obj) = value.as_object_mut() {
                obj.insert("type".into(), json!("ticket"));
            }
            value
        })
        .collect();

    let users: Vec<Value> = results
        .users
        .iter()
        .map(|row| {
            json!({
                "id": row.id.to_string(),
                "name": row.name,
                "email": row.email,
                "role": row.role,
                "department": row.department,
                "location": row.location,
                "createdAt": row.created_at,
                "ticketCount": row.ticket_count,
                "type": "user",
            })
        })
        .collect();

    let comments: Vec<Value> = results
        .comments
        .iter()
        .map(|row| {
            json!({
                "id": row.id.to_string(),
                "ticketId": row.ticket_id.to_string(),
                "userId": row.user_id.to_string(),
                "content": row.content,
                "isInternal": row.is_internal != 0,
                "createdAt": row.created_at,
                "ticketTitle": row.ticket_title,
                "userName": row.user_name,
                "userEmail": row.user_email,
                "type": "comment",
            })
        })
        .collect();

    let total = tickets.len() + users.len() + comments.len();
    Ok(Json(json!({
        "success": true,
        "results": {
            "tickets": tickets,
            "users": users,
            "comments": comments,
        },
        "totalResults": total,
        "searchTerm": term,
        "entity": query.entity.unwrap_or_else(|| "all".to_string()),
    })))
}

/// Flat query-string variant of the ticket filter, used by the search page.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TicketSearchQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub assigned_to: Option<String>,
    pub created_by: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// comma-separated
    pub tags: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl TicketSearchQuery {
    fn into_filter(self) -> TicketFilter {
        let single = |v: Option<String>| v.filter(|s| !s.is_empty()).into_iter().collect();
        let id_single = |v: Option<String>| {
            v.filter(|s| !s.is_empty())
                .map(IdValue::Text)
                .into_iter()
                .collect()
        };
        TicketFilter {
            status: single(self.status),
            priority: single(self.priority),
            category: single(self.category),
            assigned_to: id_single(self.assigned_to),
            created_by: id_single(self.created_by),
            date_range: DateRange {
                from: self.date_from.filter(|s| !s.is_empty()),
                to: self.date_to.filter(|s| !s.is_empty()),
            },
            tags: self
                .tags
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            search_term: self.q.unwrap_or_default(),
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// GET /search/tickets - filtered ticket search with pagination
pub async fn search_tickets_get(
    Extension(user): Extension<AuthUser>,
    Query(query): Query<TicketSearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = query.into_filter();
    let default_limit = config::config().pagination.filter_limit;
    let (rows, total, limit, offset) =
        ticket_service::filter_tickets(&user, &filter, default_limit).await?;

    Ok(Json(json!({
        "success": true,
        "tickets": tickets_to_dtos(&rows),
        "pagination": {
            "total": total,
            "limit": limit,
            "offset": offset,
            "hasMore": offset + limit < total,
        },
        "searchTerm": filter.search_term,
    })))
}
