use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub app_name: String,
    pub app_url: String,

    // Database
    pub database_url: String,

    // Uploads
    pub upload_dir: String,
    pub max_upload_bytes: usize,

    // Sessions and tokens
    pub session_lifetime_minutes: i64,
    pub remember_days: i64,
    pub reset_token_ttl_minutes: i64,

    // Listing pages
    pub per_page: u32,

    // Localization
    pub default_locale: String,

    // Bootstrapping
    pub admin_email: Option<String>,

    // Scheduler (cron with seconds field)
    pub prune_schedule: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port: u16 = match std::env::var("PORT") {
            Ok(v) => v.parse().context("PORT must be a valid port number")?,
            Err(_) => 8080,
        };

        Ok(Self {
            port,
            app_name: std::env::var("APP_NAME")
                .unwrap_or_else(|_| "Property Listings".to_string()),
            app_url: std::env::var("APP_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),

            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://listings.db".to_string()),

            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "storage/uploads".to_string()),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 2 * 1024 * 1024),

            session_lifetime_minutes: parse_or("SESSION_LIFETIME_MINUTES", 120),
            remember_days: parse_or("REMEMBER_DAYS", 30),
            reset_token_ttl_minutes: parse_or("RESET_TOKEN_TTL_MINUTES", 60),

            per_page: parse_or("PER_PAGE", 12),

            default_locale: std::env::var("DEFAULT_LOCALE").unwrap_or_else(|_| "en".to_string()),

            admin_email: std::env::var("ADMIN_EMAIL")
                .ok()
                .map(|email| email.trim().to_lowercase())
                .filter(|email| !email.is_empty()),

            prune_schedule: std::env::var("PRUNE_SCHEDULE")
                .unwrap_or_else(|_| "0 0 * * * *".to_string()),
        })
    }
}

/// Parse an optional numeric variable, falling back when unset or malformed
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
