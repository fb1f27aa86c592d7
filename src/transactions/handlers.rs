use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::extractors::CurrentUser;
use crate::error::{is_foreign_key_violation, ApiError};
use crate::state::AppState;
use crate::transactions::dto::{TransactionOut, TransactionPayload, TransactionQuery};
use crate::transactions::export::csv_stream;

pub fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list).post(create))
        .route("/transactions/export", get(export))
        .route("/transactions/:id", put(update).delete(delete))
}

/// A referenced category must exist for the acting user. The foreign key
/// still guards the insert if the category is deleted concurrently.
async fn ensure_category(
    state: &AppState,
    user_id: Uuid,
    category_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if let Some(id) = category_id {
        if state.categories.find_by_id(user_id, id).await?.is_none() {
            return Err(ApiError::Validation("Invalid category".into()));
        }
    }
    Ok(())
}

#[instrument(skip(state, user))]
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<Vec<TransactionOut>>, ApiError> {
    let transactions = state.transactions.list(user.id, &query.filter()).await?;
    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, user, payload))]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<TransactionPayload>,
) -> Result<(StatusCode, Json<TransactionOut>), ApiError> {
    let data = payload.validated()?;
    ensure_category(&state, user.id, data.category_id).await?;

    let transaction = match state.transactions.create(user.id, &data).await {
        Ok(transaction) => transaction,
        Err(e) if is_foreign_key_violation(&e) => {
            warn!(user_id = %user.id, "category vanished before insert");
            return Err(ApiError::Validation("Invalid category".into()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, transaction_id = %transaction.id, "transaction created");
    Ok((StatusCode::CREATED, Json(transaction.into())))
}

#[instrument(skip(state, user, payload))]
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionPayload>,
) -> Result<Json<TransactionOut>, ApiError> {
    let data = payload.validated()?;
    ensure_category(&state, user.id, data.category_id).await?;

    let transaction = match state.transactions.update(user.id, id, &data).await {
        Ok(Some(transaction)) => transaction,
        Ok(None) => return Err(ApiError::NotFound("Transaction not found")),
        Err(e) if is_foreign_key_violation(&e) => {
            warn!(user_id = %user.id, "category vanished before update");
            return Err(ApiError::Validation("Invalid category".into()));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(transaction.into()))
}

#[instrument(skip(state, user))]
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.transactions.delete(user.id, id).await? {
        return Err(ApiError::NotFound("Transaction not found"));
    }
    info!(user_id = %user.id, transaction_id = %id, "transaction deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, user))]
pub async fn export(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<TransactionQuery>,
) -> Result<Response, ApiError> {
    if !state.config.enable_csv_export {
        return Err(ApiError::Forbidden("CSV export is disabled"));
    }

    let transactions = state.transactions.list(user.id, &query.filter()).await?;
    info!(user_id = %user.id, rows = transactions.len(), "csv export");

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"transactions.csv\"",
        )
        .body(Body::from_stream(csv_stream(transactions)))
        .map_err(|e| ApiError::Internal(e.into()))?;
    Ok(response)
}
