use axum::{extract::Query, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::format::tickets_to_dtos;
use crate::config;
use crate::error::ApiError;
use crate::filter::TicketFilter;
use crate::middleware::AuthUser;
use crate::services::ticket_service;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FilterQuery {
    /// JSON-encoded TicketFilter
    pub filters: Option<String>,
}

/// GET /tickets/filter?filters={...} - structured filtering with pagination
pub async fn filter_get(
    Extension(user): Extension<AuthUser>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter: TicketFilter = match query.filters.as_deref() {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|_| ApiError::validation_error("Invalid filters format"))?,
        None => TicketFilter::default(),
    };

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
        "appliedFilters": filter,
    })))
}

/// POST /tickets/filter - distinct filter option values within scope
pub async fn filter_post(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let options = ticket_service::filter_options(&user).await?;

    Ok(Json(json!({
        "success": true,
        "filterOptions": options,
    })))
}
