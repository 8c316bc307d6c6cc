use axum::Json;
use serde_json::{json, Value};

use crate::api::format::user_to_dto;
use crate::error::ApiError;
use crate::services::user_service::{self, LoginRequest};

/// POST /auth/login - authenticate and receive a bearer token
pub async fn login_post(Json(payload): Json<LoginRequest>) -> Result<Json<Value>, ApiError> {
    let (user, token) = user_service::login(payload).await?;

    Ok(Json(json!({
        "user": user_to_dto(&user),
        "token": token,
    })))
}
