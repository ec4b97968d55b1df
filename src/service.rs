//! Idea operations behind the HTTP handlers: validation, rate limiting and
//! the calls into the store.

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::AppError;
use crate::metrics::{IDEAS_CREATED, RATE_LIMITED, UPVOTES_APPLIED};
use crate::models::{Idea, MAX_IDEA_CHARS, SortMode};
use crate::rate_limit::{Quota, RateLimiter};
use crate::store::IdeaStore;

pub const EMPTY_IDEA: &str = "Idea cannot be empty";
pub const IDEA_TOO_LONG: &str = "Idea must be 280 characters or less";

/// Trim `text` and check its length in characters. Returns the text to store.
pub fn validate_text(text: &str) -> Result<String, AppError> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(AppError::Validation(EMPTY_IDEA.to_string()));
    }
    if trimmed.chars().count() > MAX_IDEA_CHARS {
        return Err(AppError::Validation(IDEA_TOO_LONG.to_string()));
    }

    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, Copy)]
pub struct ListLimits {
    pub default: usize,
    pub max: usize,
}

impl Default for ListLimits {
    fn default() -> Self {
        Self {
            default: 50,
            max: 100,
        }
    }
}

impl ListLimits {
    // Missing, unparsable or zero falls back to the default; anything else is capped
    pub fn resolve(&self, raw: Option<&str>) -> usize {
        match raw.and_then(|s| s.trim().parse::<usize>().ok()) {
            Some(0) | None => self.default.min(self.max),
            Some(n) => n.min(self.max),
        }
    }
}

#[derive(Clone)]
pub struct IdeaService {
    store: Arc<dyn IdeaStore>,
    limiter: RateLimiter,
    create_quota: Quota,
    upvote_quota: Quota,
    limits: ListLimits,
}

impl IdeaService {
    pub fn new(
        store: Arc<dyn IdeaStore>,
        limiter: RateLimiter,
        create_quota: Quota,
        upvote_quota: Quota,
        limits: ListLimits,
    ) -> Self {
        Self {
            store,
            limiter,
            create_quota,
            upvote_quota,
            limits,
        }
    }

    pub fn limits(&self) -> ListLimits {
        self.limits
    }

    // create and upvote keep separate counters for the same client
    fn check_quota(&self, action: &str, client: &str, quota: Quota) -> Result<(), AppError> {
        let key = format!("{action}:{client}");
        if self.limiter.allow(&key, quota) {
            return Ok(());
        }

        RATE_LIMITED.inc();
        warn!(client, action, "Rate limit exceeded");
        Err(AppError::RateLimited)
    }

    /// Spend one unit of the create quota for `client`.
    pub fn admit_create(&self, client: &str) -> Result<(), AppError> {
        self.check_quota("create", client, self.create_quota)
    }

    pub async fn create(&self, client: &str, text: &str) -> Result<Idea, AppError> {
        self.admit_create(client)?;

        let text = validate_text(text)?;
        let idea = self
            .store
            .insert(text)
            .await
            .map_err(|e| AppError::from_store(e, "Failed to create idea"))?;

        IDEAS_CREATED.inc();
        info!(id = %idea.id, "Idea created");
        Ok(idea)
    }

    pub async fn list(&self, sort: SortMode, limit: usize) -> Result<Vec<Idea>, AppError> {
        self.store
            .list(sort, limit)
            .await
            .map_err(|e| AppError::from_store(e, "Failed to fetch ideas"))
    }

    pub async fn upvote(&self, client: &str, id: &str) -> Result<Idea, AppError> {
        self.check_quota("upvote", client, self.upvote_quota)?;

        let idea = self
            .store
            .increment_votes(id)
            .await
            .map_err(|e| AppError::from_store(e, "Failed to upvote idea"))?;

        UPVOTES_APPLIED.inc();
        Ok(idea)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryIdeaStore;
    use std::time::Duration;

    fn service(create: u32, upvote: u32) -> (IdeaService, Arc<MemoryIdeaStore>) {
        let store = Arc::new(MemoryIdeaStore::new());
        let service = IdeaService::new(
            store.clone(),
            RateLimiter::new(),
            Quota::new(create, Duration::from_secs(60)),
            Quota::new(upvote, Duration::from_secs(60)),
            ListLimits::default(),
        );
        (service, store)
    }

    #[test]
    fn validate_trims_and_checks_bounds() {
        assert_eq!(validate_text("  Hello  ").unwrap(), "Hello");
        assert_eq!(validate_text(&"a".repeat(280)).unwrap().len(), 280);

        let err = validate_text("   \n\t").unwrap_err();
        assert_eq!(err.to_string(), EMPTY_IDEA);

        let err = validate_text(&"a".repeat(281)).unwrap_err();
        assert_eq!(err.to_string(), IDEA_TOO_LONG);
    }

    #[test]
    fn validate_counts_characters_not_bytes() {
        // 280 two-byte characters
        assert!(validate_text(&"é".repeat(280)).is_ok());
        assert!(validate_text(&"é".repeat(281)).is_err());
    }

    #[test]
    fn list_limit_resolution() {
        let limits = ListLimits {
            default: 50,
            max: 100,
        };
        assert_eq!(limits.resolve(None), 50);
        assert_eq!(limits.resolve(Some("abc")), 50);
        assert_eq!(limits.resolve(Some("0")), 50);
        assert_eq!(limits.resolve(Some("-3")), 50);
        assert_eq!(limits.resolve(Some("7")), 7);
        assert_eq!(limits.resolve(Some("1000")), 100);
    }

    #[tokio::test]
    async fn invalid_text_is_never_persisted() {
        let (service, store) = service(10, 20);

        let long = "x".repeat(281);
        for bad in ["", "    ", long.as_str()] {
            let err = service.create("1.1.1.1", bad).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn create_quota_is_separate_from_upvote_quota() {
        let (service, _) = service(1, 2);

        let idea = service.create("ip", "one").await.unwrap();
        assert!(matches!(
            service.create("ip", "two").await.unwrap_err(),
            AppError::RateLimited
        ));

        // upvotes still have their own budget
        service.upvote("ip", &idea.id).await.unwrap();
        let idea = service.upvote("ip", &idea.id).await.unwrap();
        assert_eq!(idea.votes, 2);
        assert!(matches!(
            service.upvote("ip", &idea.id).await.unwrap_err(),
            AppError::RateLimited
        ));
    }

    #[tokio::test]
    async fn upvote_missing_idea_is_not_found() {
        let (service, _) = service(10, 20);
        let err = service.upvote("ip", "does-not-exist").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn upvote_is_not_idempotent() {
        let (service, _) = service(10, 20);
        let idea = service.create("ip", "again").await.unwrap();

        service.upvote("ip", &idea.id).await.unwrap();
        let idea = service.upvote("ip", &idea.id).await.unwrap();
        assert_eq!(idea.votes, 2);
    }
}
