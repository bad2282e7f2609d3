use std::sync::Arc;

use anyhow::{Context, Result};
use property_listings::{config, db::Database, notify::LogNotifier, scheduler, server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("property_listings=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!("Starting property listings server");

    // Load configuration from environment
    let config = config::Config::from_env()?;

    let db = Database::new(&config.database_url).await?;
    info!("✓ Database ready");

    std::fs::create_dir_all(&config.upload_dir)
        .with_context(|| format!("Failed to create upload directory {}", config.upload_dir))?;

    let state = server::AppState::new(config, db.clone(), Arc::new(LogNotifier));

    // Keep the scheduler alive for the lifetime of the server
    let _scheduler = scheduler::start_scheduler(Arc::clone(&state.config), db).await?;

    server::serve(state).await
}
