//! HTTP routes

pub mod health;
pub mod sign;
pub mod signatures;
pub mod users;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router. Shared by the binary and the HTTP tests.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", axum::routing::get(health::health_check))
        .route("/api/v1/health", axum::routing::get(health::health_check))
        .nest("/api/v1/users", users::router())
        .nest("/api/v1/signatures", signatures::router())
        .nest("/api/v1/sign", sign::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
