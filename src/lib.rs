pub mod agent;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod routes;
pub mod service;

use axum::{routing::get, routing::post, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::agent::CompletionProvider;
use crate::db::ChatStore;
use crate::routes::api_routes::{chat_handler, get_chat_handler, list_chats_handler};
use crate::routes::chat_routes::index_handler;
use crate::service::chat_service::ChatService;

/// Builds the full HTTP surface around `chat_service`.
pub fn build_router<S: ChatStore, P: CompletionProvider>(
    chat_service: ChatService<S, P>,
    cors_permissive: bool,
) -> Router {
    let router = Router::new()
        // Page routes
        .route("/", get(index_handler))
        // JSON API
        .route("/api", post(chat_handler::<S, P>))
        .route("/api/chats", get(list_chats_handler::<S, P>))
        .route("/api/chats/{id}", get(get_chat_handler::<S, P>))
        .layer(TraceLayer::new_for_http())
        .with_state(chat_service);

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
