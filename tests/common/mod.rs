#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;

use idea_board::build_app;
use idea_board::models::{Idea, SortMode};
use idea_board::rate_limit::{Quota, RateLimiter};
use idea_board::service::{IdeaService, ListLimits};
use idea_board::state::AppState;
use idea_board::store::{IdeaStore, MemoryIdeaStore, StoreError};

/// Router over a fresh in-memory store with the given per-minute quotas.
pub fn test_app(create_limit: u32, upvote_limit: u32) -> (Router, Arc<MemoryIdeaStore>) {
    let store = Arc::new(MemoryIdeaStore::new());
    (app_over(store.clone(), create_limit, upvote_limit), store)
}

/// Router whose store fails every call as an unreachable database would.
pub fn failing_app() -> Router {
    app_over(Arc::new(FailingIdeaStore), 10, 20)
}

fn app_over(store: Arc<dyn IdeaStore>, create_limit: u32, upvote_limit: u32) -> Router {
    let service = IdeaService::new(
        store,
        RateLimiter::new(),
        Quota::new(create_limit, Duration::from_secs(60)),
        Quota::new(upvote_limit, Duration::from_secs(60)),
        ListLimits::default(),
    );
    build_app(Arc::new(AppState::new(service)))
}

pub struct FailingIdeaStore;

impl FailingIdeaStore {
    fn down() -> StoreError {
        StoreError::Database(sqlx::Error::PoolTimedOut)
    }
}

#[async_trait]
impl IdeaStore for FailingIdeaStore {
    async fn insert(&self, _text: String) -> Result<Idea, StoreError> {
        Err(Self::down())
    }

    async fn list(&self, _sort: SortMode, _limit: usize) -> Result<Vec<Idea>, StoreError> {
        Err(Self::down())
    }

    async fn increment_votes(&self, _id: &str) -> Result<Idea, StoreError> {
        Err(Self::down())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Err(Self::down())
    }
}
