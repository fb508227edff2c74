use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use newsroom_gate::app;
use newsroom_gate::config::Args;
use newsroom_gate::error::Result;
use newsroom_gate::permissions::InMemoryDirectory;
use newsroom_gate::rate_limit::RateLimitStore;
use newsroom_gate::state::AppState;
use newsroom_gate::sweeper::spawn_sweeper;

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let default_limit = args.default_rate_limit()?;

    let directory = match &args.grants {
        Some(path) => InMemoryDirectory::load(path)?,
        None => {
            info!("No grants file given, starting with an empty directory");
            InMemoryDirectory::new()
        }
    };

    let rate_limiter = Arc::new(RateLimitStore::default());
    let api_limiter = Arc::new(RateLimitStore::default());
    let state = AppState::new(
        rate_limiter.clone(),
        api_limiter.clone(),
        default_limit,
        args.trust_proxy,
        Arc::new(directory),
        !args.no_permission_cache,
    );

    let sweeper = spawn_sweeper(vec![rate_limiter, api_limiter], args.sweep_every());

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Gateway running on http://localhost:{}", args.port);
    info!(
        "Rate limit: {} requests per {} seconds",
        default_limit.max_requests, args.rate_window
    );
    info!(
        "Permission cache: {}",
        if args.no_permission_cache { "off" } else { "on" }
    );

    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}
