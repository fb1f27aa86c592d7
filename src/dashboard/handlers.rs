use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use time::Date;
use tracing::instrument;

use crate::auth::extractors::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::transactions::repo::Summary;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/dashboard/summary", get(summary))
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    #[serde(default, with = "crate::iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "crate::iso_date::option")]
    pub end_date: Option<Date>,
}

#[instrument(skip(state, user))]
pub async fn summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<Summary>, ApiError> {
    let summary = state
        .transactions
        .summarize(user.id, query.start_date, query.end_date)
        .await?;
    Ok(Json(summary))
}
