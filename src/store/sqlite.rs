use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;

use super::{IdeaStore, StoreError, new_id};
use crate::models::{Idea, SortMode};

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS ideas (
        id TEXT PRIMARY KEY NOT NULL,
        text TEXT NOT NULL CHECK (length(text) BETWEEN 1 AND 280),
        votes INTEGER NOT NULL DEFAULT 0 CHECK (votes >= 0),
        created_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS ideas_created_at_idx ON ideas (created_at DESC)",
    "CREATE INDEX IF NOT EXISTS ideas_votes_idx ON ideas (votes DESC)",
];

/// Ideas in a SQLite database.
///
/// `created_at` is stored as integer microseconds since the epoch so that
/// ordering in SQL matches ordering of the timestamps.
pub struct SqliteIdeaStore {
    pool: SqlitePool,
}

impl SqliteIdeaStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // every connection to :memory: is its own database, keep exactly one alive
        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }
}

fn idea_from_row(row: &SqliteRow) -> Result<Idea, sqlx::Error> {
    let votes: i64 = row.try_get("votes")?;
    let micros: i64 = row.try_get("created_at")?;
    let created_at = DateTime::<Utc>::from_timestamp_micros(micros)
        .ok_or_else(|| sqlx::Error::Decode(format!("invalid created_at {micros}").into()))?;

    Ok(Idea {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        votes: votes.max(0) as u64,
        created_at,
    })
}

#[async_trait]
impl IdeaStore for SqliteIdeaStore {
    async fn insert(&self, text: String) -> Result<Idea, StoreError> {
        let idea = Idea {
            id: new_id(),
            text,
            votes: 0,
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO ideas (id, text, votes, created_at) VALUES (?, ?, 0, ?)")
            .bind(&idea.id)
            .bind(&idea.text)
            .bind(idea.created_at.timestamp_micros())
            .execute(&self.pool)
            .await?;

        Ok(idea)
    }

    async fn list(&self, sort: SortMode, limit: usize) -> Result<Vec<Idea>, StoreError> {
        let sql = match sort {
            SortMode::New => {
                "SELECT id, text, votes, created_at FROM ideas
                 ORDER BY created_at DESC, id DESC LIMIT ?"
            }
            SortMode::Top => {
                "SELECT id, text, votes, created_at FROM ideas
                 ORDER BY votes DESC, created_at DESC, id DESC LIMIT ?"
            }
        };

        let rows = sqlx::query(sql)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| idea_from_row(row).map_err(StoreError::from))
            .collect()
    }

    async fn increment_votes(&self, id: &str) -> Result<Idea, StoreError> {
        // single statement, so the read-modify-write happens inside SQLite
        let row = sqlx::query(
            "UPDATE ideas SET votes = votes + 1 WHERE id = ?
             RETURNING id, text, votes, created_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(idea_from_row(&row)?),
            None => Err(StoreError::NotFound),
        }
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ideas")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as usize)
    }
}
