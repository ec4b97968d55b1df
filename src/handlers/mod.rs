mod health;
mod ideas;
mod metrics;

pub use health::health_handler;
pub use ideas::{create_idea_handler, list_ideas_handler, upvote_handler};
pub use metrics::metrics_handler;
