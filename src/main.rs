use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use idea_board::build_app;
use idea_board::config::Args;
use idea_board::rate_limit::RateLimiter;
use idea_board::service::{IdeaService, ListLimits};
use idea_board::state::AppState;
use idea_board::store;

// this is main async function with tokio
#[tokio::main]
async fn main() {
    // parse cli arguments
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let store = match store::connect(args.database_url.as_deref()).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open idea store: {}", e);
            std::process::exit(1);
        }
    };

    let (limiter, sweeper) = RateLimiter::init(args.sweep_interval());

    let service = IdeaService::new(
        store,
        limiter,
        args.create_quota(),
        args.upvote_quota(),
        ListLimits {
            default: args.default_limit,
            max: args.max_limit,
        },
    );
    let state = Arc::new(AppState::new(service));
    let app = build_app(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = TcpListener::bind(&addr).await.expect("Failed to bind address");

    info!("Idea board running on http://localhost:{}", args.port);
    info!(
        "Rate limits: {} creates / {} upvotes per {} seconds",
        args.create_rate_limit, args.upvote_rate_limit, args.rate_window
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    sweeper.shutdown().await;
    info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
