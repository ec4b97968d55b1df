use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::client_ip::ClientKey;
use crate::error::AppError;
use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{CreateIdeaRequest, IdeaListResponse, IdeaResponse, ListQuery, SortMode};
use crate::state::AppState;

// GET /ideas?sort=new|top&limit=N
pub async fn list_ideas_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<IdeaListResponse>, AppError> {
    REQUEST_TOTAL.inc();
    let start_time = Instant::now();

    let sort = SortMode::parse(query.sort.as_deref());
    let limit = state.service.limits().resolve(query.limit.as_deref());
    let ideas = state.service.list(sort, limit).await?;

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
    debug!(sort = sort.as_str(), limit, count = ideas.len(), "Listed ideas");

    Ok(Json(IdeaListResponse {
        ideas,
        success: true,
    }))
}

// POST /ideas
pub async fn create_idea_handler(
    State(state): State<Arc<AppState>>,
    client: ClientKey,
    payload: Result<Json<CreateIdeaRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IdeaResponse>), AppError> {
    REQUEST_TOTAL.inc();
    let start_time = Instant::now();

    let text = match payload {
        Ok(Json(body)) => body.text,
        Err(rejection) => {
            // malformed bodies still spend quota
            state.service.admit_create(client.as_str())?;
            debug!("Rejected create body: {}", rejection);
            return Err(AppError::Validation("Invalid input".to_string()));
        }
    };

    let idea = state.service.create(client.as_str(), &text).await?;

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    Ok((
        StatusCode::CREATED,
        Json(IdeaResponse {
            idea,
            success: true,
        }),
    ))
}

// POST /ideas/{id}/upvote
pub async fn upvote_handler(
    State(state): State<Arc<AppState>>,
    client: ClientKey,
    Path(id): Path<String>,
) -> Result<Json<IdeaResponse>, AppError> {
    REQUEST_TOTAL.inc();
    let start_time = Instant::now();

    let idea = state.service.upvote(client.as_str(), &id).await?;

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    Ok(Json(IdeaResponse {
        idea,
        success: true,
    }))
}
