pub mod dto;
pub mod handlers;
pub mod services;
pub mod types;

use crate::state::AppState;
use axum::Router;

pub fn router(max_body_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(handlers::scan_routes(max_body_bytes))
        .merge(handlers::health_routes())
}
