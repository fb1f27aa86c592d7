use axum::Router;

use crate::state::AppState;

pub mod handlers;

pub fn router() -> Router<AppState> {
    handlers::dashboard_routes()
}
