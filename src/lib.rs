//! Anonymous idea board.
//!
//! The server side is an axum service: ideas are created, listed newest or
//! most-voted first, and upvoted, with per-client fixed-window rate limits
//! on the two write paths. The [`client`] module holds the board logic a
//! front end needs: optimistic inserts and upvotes, reconciliation against
//! the server's list, and the locally persisted set of upvoted ids.

pub mod app;
pub mod client;
pub mod client_ip;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod service;
pub mod state;
pub mod store;

pub use app::build_app;
