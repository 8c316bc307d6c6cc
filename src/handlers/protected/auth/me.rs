use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::api::format::user_to_dto;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::user_service;

/// GET /auth/me - resolve the identity behind the bearer token
pub async fn me_get(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let row = user_service::me(user.user_id).await?;
    Ok(Json(json!({ "user": user_to_dto(&row) })))
}
