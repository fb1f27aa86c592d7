use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::extractors::CurrentUser;
use crate::categories::dto::{CategoryOut, CategoryPayload};
use crate::error::ApiError;
use crate::state::AppState;

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list).post(create))
        .route("/categories/:id", put(update).delete(delete))
}

#[instrument(skip(state, user))]
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CategoryOut>>, ApiError> {
    let categories = state.categories.list(user.id).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, user, payload))]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CategoryPayload>,
) -> Result<(StatusCode, Json<CategoryOut>), ApiError> {
    let name = payload.validated_name()?;
    let category = state.categories.create(user.id, &name, payload.r#type).await?;
    info!(user_id = %user.id, category_id = %category.id, "category created");
    Ok((StatusCode::CREATED, Json(category.into())))
}

#[instrument(skip(state, user, payload))]
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryPayload>,
) -> Result<Json<CategoryOut>, ApiError> {
    let name = payload.validated_name()?;
    let category = state
        .categories
        .update(user.id, id, &name, payload.r#type)
        .await?
        .ok_or(ApiError::NotFound("Category not found"))?;
    Ok(Json(category.into()))
}

#[instrument(skip(state, user))]
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.categories.delete(user.id, id).await? {
        return Err(ApiError::NotFound("Category not found"));
    }
    info!(user_id = %user.id, category_id = %id, "category deleted");
    Ok(StatusCode::NO_CONTENT)
}
