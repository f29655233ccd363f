pub mod chat;
pub mod error;
pub mod health;
pub mod models_list;
pub mod routing_info;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// Every error class resolves to the envelope in [`error`] — unknown
/// paths and mismatched methods included, so the framework default shape
/// never reaches a client.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/chat/completions",
            post(chat::chat_completions).fallback(error::method_not_allowed),
        )
        .route(
            "/v1/models",
            get(models_list::list_models).fallback(error::method_not_allowed),
        )
        .route(
            "/health",
            get(health::health).fallback(error::method_not_allowed),
        )
        .route(
            "/memory-routing/info",
            get(routing_info::info).fallback(error::method_not_allowed),
        )
        .fallback(error::not_found)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
