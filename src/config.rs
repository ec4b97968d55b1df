use clap::Parser;
use std::time::Duration;

use crate::rate_limit::Quota;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "idea-board")]
#[command(about = "Anonymous idea board: post ideas, list them, upvote them")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "IDEA_BOARD_PORT", default_value_t = 8080)]
    pub port: u16,

    // SQLite url, e.g. "sqlite://ideas.db". Ideas stay in memory when unset
    #[arg(short, long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    // Max idea creations per client per window
    #[arg(long, default_value_t = 10)]
    pub create_rate_limit: u32,

    // Max upvotes per client per window
    #[arg(long, default_value_t = 20)]
    pub upvote_rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, default_value_t = 60)]
    pub rate_window: u64,

    // How often expired rate limit entries are swept, in seconds
    #[arg(long, default_value_t = 60)]
    pub sweep_interval: u64,

    // Ideas returned by GET /ideas when no limit is given
    #[arg(long, default_value_t = 50)]
    pub default_limit: usize,

    // Upper bound on the limit a client may ask for
    #[arg(long, default_value_t = 100)]
    pub max_limit: usize,

    // Tracing filter, e.g. "info" or "idea_board=debug,tower_http=info"
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn create_quota(&self) -> Quota {
        Quota::new(self.create_rate_limit, self.rate_window())
    }

    pub fn upvote_quota(&self) -> Quota {
        Quota::new(self.upvote_rate_limit, self.rate_window())
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_quotas() {
        let args = Args::try_parse_from(["idea-board"]).unwrap();

        assert_eq!(args.port, 8080);
        assert_eq!(args.create_quota(), Quota::new(10, Duration::from_secs(60)));
        assert_eq!(args.upvote_quota(), Quota::new(20, Duration::from_secs(60)));
        assert_eq!(args.default_limit, 50);
        assert_eq!(args.max_limit, 100);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "idea-board",
            "--port",
            "9000",
            "--database-url",
            "sqlite::memory:",
            "--upvote-rate-limit",
            "5",
            "--rate-window",
            "10",
        ])
        .unwrap();

        assert_eq!(args.port, 9000);
        assert_eq!(args.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(args.upvote_quota(), Quota::new(5, Duration::from_secs(10)));
    }
}
