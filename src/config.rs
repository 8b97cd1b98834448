use secrecy::Secret;
use serde::Deserialize;

const DEFAULT_PREMIUM_PRICE: f64 = 9.99;
const DEFAULT_PREMIUM_PERIOD_DAYS: i64 = 30;
const DEFAULT_PREMIUM_EXPIRY_SCHEDULE: &str = "0 0 3 * * *";
const DEFAULT_MAX_BACKGROUND_BYTES: u64 = 5 * 1024 * 1024;
const DEFAULT_REMOTE_FETCH_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub base_url: String,
    pub host: String,
    pub port: u16,

    // Payments
    pub payment_encryption_key: Secret<String>,
    pub premium_price: f64,
    pub premium_period_days: i64,
    /// Cron expression for the premium expiry sweep; `None` disables it
    pub premium_expiry_schedule: Option<String>,

    // Card rendering
    pub assets_dir: String,
    pub max_background_bytes: u64,
    pub remote_fetch_timeout_secs: u64,

    pub cors_allowed_origin: Option<String>,

    // Bootstrap admin account
    pub admin_email: Option<String>,
    pub admin_password: Option<Secret<String>>,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Self::from_source(&config)
    }

    pub fn from_source(config: &config::Config) -> Result<Self, config::ConfigError> {
        let premium_expiry_schedule = match config.get::<String>("premium_expiry_schedule") {
            Ok(schedule) if schedule.trim().is_empty() => None,
            Ok(schedule) => Some(schedule),
            Err(_) => Some(DEFAULT_PREMIUM_EXPIRY_SCHEDULE.to_string()),
        };

        Ok(Self {
            database_url: config.get("database_url")?,
            base_url: config.get("base_url")?,
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port")?,

            payment_encryption_key: Secret::new(config.get("payment_encryption_key")?),
            premium_price: config.get("premium_price").unwrap_or(DEFAULT_PREMIUM_PRICE),
            premium_period_days: config
                .get("premium_period_days")
                .unwrap_or(DEFAULT_PREMIUM_PERIOD_DAYS),
            premium_expiry_schedule,

            assets_dir: config
                .get("assets_dir")
                .unwrap_or_else(|_| "web/static".to_string()),
            max_background_bytes: config
                .get("max_background_bytes")
                .unwrap_or(DEFAULT_MAX_BACKGROUND_BYTES),
            remote_fetch_timeout_secs: config
                .get("remote_fetch_timeout_secs")
                .unwrap_or(DEFAULT_REMOTE_FETCH_TIMEOUT_SECS),

            cors_allowed_origin: config.get("cors_allowed_origin").ok(),

            admin_email: config.get("admin_email").ok(),
            admin_password: config
                .get::<String>("admin_password")
                .ok()
                .map(Secret::new),
        })
    }

    /// Cookies are only marked secure when served over HTTPS
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}
