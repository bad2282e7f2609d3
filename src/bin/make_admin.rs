use anyhow::{bail, Context, Result};
use property_listings::{config, db::Database, models::Role};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("make_admin=info".parse()?),
        )
        .init();

    let email = match std::env::args().nth(1) {
        Some(email) => email.trim().to_lowercase(),
        None => bail!("Usage: make-admin <email>"),
    };

    let config = config::Config::from_env()?;
    let db = Database::new(&config.database_url).await?;

    let user = db
        .find_user_by_email(&email)
        .await
        .context("Failed to look up user")?
        .with_context(|| format!("No user registered with {}", email))?;

    if user.role == Role::Admin {
        info!("{} is already an admin", email);
        return Ok(());
    }

    db.set_role(user.id, Role::Admin)
        .await
        .context("Failed to update role")?;

    info!("✓ Promoted {} (id {}) to admin", email, user.id);
    Ok(())
}
