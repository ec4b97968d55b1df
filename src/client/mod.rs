//! Client side of the board.
//!
//! [`Board`] keeps what a front end displays: the server's list merged with
//! locally pending placeholders, optimistic vote bumps, and the set of ideas
//! this client has already upvoted. The server is reached through
//! [`IdeaApi`] and the upvoted set is persisted through [`UpvoteStorage`],
//! so both can be swapped out in tests.

use thiserror::Error;

pub mod api;
pub mod board;
pub mod reconcile;
pub mod storage;

pub use api::{HttpIdeaApi, IdeaApi};
pub use board::{Board, PollerHandle, UpvoteOutcome};
pub use reconcile::merge;
pub use storage::{FileUpvoteStorage, MemoryUpvoteStorage, UpvoteStorage};

#[derive(Error, Debug)]
pub enum ClientError {
    /// Rejected locally before anything was sent.
    #[error("{0}")]
    Invalid(String),

    /// The server answered with an error envelope.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Malformed data: {0}")]
    Codec(#[from] serde_json::Error),
}
