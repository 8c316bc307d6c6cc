use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

use crate::api::format::user_to_dto;
use crate::error::ApiError;
use crate::services::user_service::{self, RegisterRequest};

/// POST /auth/register - create an account and receive a bearer token
pub async fn register_post(
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (user, token) = user_service::register(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": user_to_dto(&user),
            "token": token,
        })),
    ))
}
