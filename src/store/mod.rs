//! Persistence for ideas.
//!
//! The service only talks to [`IdeaStore`]; the backing store is picked at
//! startup from the configured database url.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::models::{Idea, SortMode};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryIdeaStore;
pub use sqlite::SqliteIdeaStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Idea not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait IdeaStore: Send + Sync {
    /// Persist a new idea with zero votes. `text` is already validated.
    async fn insert(&self, text: String) -> Result<Idea, StoreError>;

    /// At most `limit` ideas in the requested order.
    async fn list(&self, sort: SortMode, limit: usize) -> Result<Vec<Idea>, StoreError>;

    /// Add exactly one vote as a single atomic step and return the updated idea.
    async fn increment_votes(&self, id: &str) -> Result<Idea, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}

/// Open the store named by `database_url`, or an in-memory one when unset.
pub async fn connect(database_url: Option<&str>) -> Result<Arc<dyn IdeaStore>, StoreError> {
    match database_url {
        Some(url) => {
            info!("Using SQLite idea store at {}", url);
            Ok(Arc::new(SqliteIdeaStore::connect(url).await?))
        }
        None => {
            info!("No database url configured, ideas are kept in memory");
            Ok(Arc::new(MemoryIdeaStore::new()))
        }
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// Newest first, ties broken by id so the order is stable
pub(crate) fn sort_ideas(ideas: &mut [Idea], sort: SortMode) {
    match sort {
        SortMode::New => ideas.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        }),
        SortMode::Top => ideas.sort_by(|a, b| {
            b.votes
                .cmp(&a.votes)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        }),
    }
}
