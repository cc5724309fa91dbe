use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ollama_client::OllamaClient;
use veracity_common::Config;
use veracity_pipeline::{
    ClaimExtractor, EvidenceSearcher, FactChecker, FeedIngestor, Orchestrator, PropagandaDetector,
};
use veracity_store::{migrate, Store};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("veracity=info".parse()?))
        .init();

    info!("Veracity pipeline starting...");

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    migrate(&pool).await?;

    let store = Store::new(pool);
    let generator: Arc<dyn ollama_client::TextGenerator> =
        Arc::new(OllamaClient::new(&config.ollama_url, &config.ollama_model));

    let orchestrator = Arc::new(Orchestrator::new(
        &config,
        store.clone(),
        FeedIngestor::new(store.clone()),
        ClaimExtractor::new(generator.clone()),
        EvidenceSearcher::new(store.clone()),
        FactChecker::new(generator.clone()),
        PropagandaDetector::new(generator),
    ));

    orchestrator.run().await
}
