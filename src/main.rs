use chrono::Utc;

mod ai;
mod app;
mod config;
mod db;
mod error;
mod feed;
mod models;
mod services;

use ai::OpenAiIdeaGenerator;
use app::{App, CycleOutcome, CycleSettings};
use config::Config;
use db::Repository;
use error::Result;
use feed::FeedFetcher;

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up OPENAI_API_KEY / MONGO_DB_URL from a local .env when present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Start {}", Utc::now());

    // Failures are logged only; the exit status stays clean.
    match run().await {
        Ok(outcome) => tracing::info!("Done: {:?}", outcome),
        Err(e) => tracing::error!("Cycle failed: {}", e),
    }

    Ok(())
}

async fn run() -> Result<CycleOutcome> {
    let config = Config::load()?;
    let fetcher = FeedFetcher::new()?;
    let generator = OpenAiIdeaGenerator::new(&config)?;
    tracing::info!("Using model {}", generator.model_version());

    let repository = Repository::new(&config.mongo_db_url, &config.db_name).await?;

    let outcome = {
        let app = App::new(&repository, &fetcher, &generator, CycleSettings::from(&config));
        app.run_cycle(Utc::now()).await
    };

    repository.close().await;
    outcome
}
