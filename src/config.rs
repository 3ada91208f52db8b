use serde::Deserialize;
use std::time::Duration;

/// `DATABASE_URL` value selecting the process-local store instead of MongoDB.
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// MongoDB connection string, or [`MEMORY_DATABASE_URL`]. `None` starts the service without a store.
    pub database_url: Option<String>,
    pub database_name: String,
    pub port: u16,
    pub server_selection_timeout_secs: u64,
    /// Requests per second per client IP on `POST /contact`. Zero disables the limiter.
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        match config.database_url.as_deref() {
            Some(MEMORY_DATABASE_URL) => {
                tracing::warn!("Using the in-memory store, leads are lost on restart")
            }
            Some(url) => tracing::debug!("Database: {} ({})", redact_url(url), config.database_name),
            None => tracing::warn!("DATABASE_URL not set, starting without a database"),
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            database_url: lookup("DATABASE_URL")
                .or_else(|| lookup("MONGODB_URL"))
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    if url == MEMORY_DATABASE_URL {
                        return Ok(url);
                    }
                    if !url.starts_with("mongodb://") && !url.starts_with("mongodb+srv://") {
                        anyhow::bail!(
                            "DATABASE_URL must start with mongodb:// or mongodb+srv://, or be \"memory\""
                        );
                    }
                    Ok(url)
                })
                .transpose()?,
            database_name: lookup("DATABASE_NAME")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "broker".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            server_selection_timeout_secs: lookup("DB_SERVER_SELECTION_TIMEOUT_SECS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_SERVER_SELECTION_TIMEOUT_SECS must be a number"))
                .and_then(|secs: u64| {
                    if secs == 0 {
                        anyhow::bail!("DB_SERVER_SELECTION_TIMEOUT_SECS must be greater than 0");
                    }
                    Ok(secs)
                })?,
            rate_limit_per_second: lookup("RATE_LIMIT_PER_SECOND")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_PER_SECOND must be a number"))?,
            rate_limit_burst: lookup("RATE_LIMIT_BURST")
                .unwrap_or_else(|| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_BURST must be a number"))
                .and_then(|burst: u32| {
                    if burst == 0 {
                        anyhow::bail!("RATE_LIMIT_BURST must be greater than 0");
                    }
                    Ok(burst)
                })?,
            max_body_bytes: lookup("MAX_BODY_BYTES")
                .unwrap_or_else(|| "65536".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_BODY_BYTES must be a number"))?,
        };

        Ok(config)
    }

    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_secs(self.server_selection_timeout_secs)
    }

    /// Interval after which the rate limiter restores one request of quota.
    ///
    /// `None` when rate limiting is disabled. Rates above 1000/s are served at 1000/s.
    pub fn rate_limit_replenish_interval(&self) -> Option<Duration> {
        match self.rate_limit_per_second {
            0 => None,
            n => Some(Duration::from_millis((1000 / n).max(1))),
        }
    }
}

/// Reduces a connection string to `scheme://host` so credentials never reach the logs.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(parsed) => format!(
            "{}://{}",
            parsed.scheme(),
            parsed.host_str().unwrap_or("<unknown host>")
        ),
        Err(_) => "<unparseable url>".to_string(),
    }
}
