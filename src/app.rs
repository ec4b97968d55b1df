use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::handlers::{
    create_idea_handler, health_handler, list_ideas_handler, metrics_handler, upvote_handler,
};
use crate::state::AppState;

/// Build the complete Axum application:
/// - /ideas, /ideas/{id}/upvote   (also mounted under /api)
/// - /health, /metrics
pub fn build_app(state: Arc<AppState>) -> Router {
    let ideas = Router::new()
        .route("/ideas", get(list_ideas_handler).post(create_idea_handler))
        .route("/ideas/{id}/upvote", post(upvote_handler));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .merge(ideas.clone())
        .nest("/api", ideas)
        .layer(cors)
        // Logging middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
