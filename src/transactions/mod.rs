use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod export;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    handlers::transaction_routes()
}
