use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}

/// Routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/books", get(handlers::get_books))
        .route("/predict", post(handlers::predict))
        // Sessions
        .route(
            "/sessions/:session_id",
            get(handlers::get_session).delete(handlers::reset_session),
        )
        .route(
            "/sessions/:session_id/ratings/:book_id",
            put(handlers::set_rating).delete(handlers::clear_rating),
        )
        .route(
            "/sessions/:session_id/recommendations",
            get(handlers::get_recommendations).post(handlers::create_recommendations),
        )
        .route("/sessions/:session_id/books", get(handlers::get_session_books))
        .route("/sessions/:session_id/books/next", post(handlers::load_next_books))
}
