use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use garde::Validate;
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::user::{User, UserId},
    state::AppState,
};

/// The request payload for creating a user.
#[derive(Deserialize, Validate, Debug)]
pub struct CreateUserRequest {
    #[garde(length(min = 1, max = 255))]
    pub first: String,
    #[garde(length(min = 1, max = 255))]
    pub last: String,
    #[garde(email)]
    pub email: String,
}

/// Query parameters for looking a user up by email.
#[derive(Deserialize, Debug)]
pub struct EmailQuery {
    pub email: String,
}

/// Handles user creation.
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Response> {
    payload
        .validate()
        .map_err(|report| AppError::Validation(report.to_string()))?;

    let mut user = User {
        id: None,
        first: payload.first.trim().to_string(),
        last: payload.last.trim().to_string(),
        email: payload.email,
    };
    state.users.create(&mut user).await?;

    if let Some(id) = user.id {
        tracing::info!("✅ User created with ID: {}", id);
    }

    Ok((StatusCode::CREATED, Json(user)).into_response())
}

/// Fetches a user by id.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>> {
    Ok(Json(state.users.find_by_id(UserId(id)).await?))
}

/// Fetches a user by email.
pub async fn find_user_by_email(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<User>> {
    Ok(Json(state.users.find_by_email(&query.email).await?))
}

/// Deletes a user. Succeeds for unknown ids.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.users.delete(UserId(id)).await?;
    tracing::info!("🗑️ User {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}
