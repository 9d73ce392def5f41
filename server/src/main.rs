use anyhow::{Context, Result};
use clap::Parser;
use fetcher::Fetcher;
use server::cache::CacheController;
use server::config::Config;
use server::build_app;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let config = Config::parse();

    let fetcher = Fetcher::new(config.fetcher_config()).context("failed to set up upstream fetcher")?;
    let cache = CacheController::new(fetcher, config.cache_options());
    tracing::info!(mode = ?config.load_mode, strategy = %config.strategy, "starting cache");
    cache.start().await.context("initial load failed")?;

    let app = build_app(cache.clone(), config.cors_allow_origin.as_deref());
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    cache.abort_background();
    tracing::info!("server stopped");
    Ok(())
}
