use axum::{extract::Path, http::StatusCode, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::format::comment_to_dto;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::ticket_service;

use super::parse_ticket_id;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentRequest {
    pub content: Option<String>,
    #[serde(default)]
    pub is_internal: bool,
}

/// GET /tickets/:id/comments
pub async fn comments_get(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_ticket_id(&id)?;
    let rows = ticket_service::list_comments(&user, id).await?;
    let comments: Vec<_> = rows.iter().map(comment_to_dto).collect();

    Ok(Json(json!({
        "comments": comments,
        "count": comments.len(),
    })))
}

/// POST /tickets/:id/comments
pub async fn comments_post(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<AddCommentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let id = parse_ticket_id(&id)?;
    let content = payload.content.unwrap_or_default();
    let row = ticket_service::add_comment(&user, id, &content, payload.is_internal).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "comment": comment_to_dto(&row),
            "message": "Comment added successfully",
        })),
    ))
}
