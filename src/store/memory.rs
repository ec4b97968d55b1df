use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::{IdeaStore, StoreError, new_id, sort_ideas};
use crate::models::{Idea, SortMode};

/// Ideas held in process memory. Votes are bumped while holding the idea's
/// map entry, so concurrent upvotes cannot lose updates.
#[derive(Default)]
pub struct MemoryIdeaStore {
    ideas: DashMap<String, Idea>,
}

impl MemoryIdeaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdeaStore for MemoryIdeaStore {
    async fn insert(&self, text: String) -> Result<Idea, StoreError> {
        let idea = Idea {
            id: new_id(),
            text,
            votes: 0,
            created_at: Utc::now(),
        };
        self.ideas.insert(idea.id.clone(), idea.clone());
        Ok(idea)
    }

    async fn list(&self, sort: SortMode, limit: usize) -> Result<Vec<Idea>, StoreError> {
        let mut ideas: Vec<Idea> = self.ideas.iter().map(|e| e.value().clone()).collect();
        sort_ideas(&mut ideas, sort);
        ideas.truncate(limit);
        Ok(ideas)
    }

    async fn increment_votes(&self, id: &str) -> Result<Idea, StoreError> {
        let mut idea = self.ideas.get_mut(id).ok_or(StoreError::NotFound)?;
        idea.votes += 1;
        Ok(idea.clone())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.ideas.len())
    }
}
