//! Scrape job API server: /start_scrape, /status/:job_id, /download/:job_id.

use scrape_api::config::ApiConfig;
use scrape_api::server::{self, AppState};
use scrape_artifact::CsvArtifactStore;
use scrape_engine::HttpScraper;
use scrape_scheduler::InMemoryScheduler;
use scrape_types::{ArtifactStore, Scraper};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;

    let store: Arc<dyn ArtifactStore> = Arc::new(CsvArtifactStore::new(&config.output_dir)?);
    let scraper: Arc<dyn Scraper> = Arc::new(HttpScraper::new(config.scraper.clone())?);
    let scheduler = Arc::new(InMemoryScheduler::new(
        Arc::clone(&scraper),
        Arc::clone(&store),
        config.scheduler.clone(),
    ));
    let state = Arc::new(AppState::new(scheduler, scraper, store));

    let app = server::router(state);
    tracing::info!(
        output_dir = %config.output_dir.display(),
        max_concurrent = config.scheduler.max_concurrent,
        "scrape API listening on {}",
        config.listen
    );
    axum::serve(
        tokio::net::TcpListener::bind(config.listen).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}
