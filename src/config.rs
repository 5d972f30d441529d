use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// Runtime configuration, loaded once in main and carried in AppState.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub token_secret: String,
    pub stripe_secret_key: String,
    pub port: u16,
    pub database_max_connections: u32,
}

impl AppConfig {
    /// Load configuration from the environment. Fails fast on missing
    /// secrets so a misconfigured process never reaches the handlers.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let token_secret = env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| ConfigError::Missing("ACCESS_TOKEN_SECRET"))?;
        let stripe_secret_key = env::var("STRIPE_SECRET_KEY")
            .map_err(|_| ConfigError::Missing("STRIPE_SECRET_KEY"))?;

        let port = match env::var("PORT") {
            Ok(v) => v
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid("PORT", v))?,
            Err(_) => 5000,
        };

        let database_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(v) => v
                .parse::<u32>()
                .map_err(|_| ConfigError::Invalid("DATABASE_MAX_CONNECTIONS", v))?,
            Err(_) => 10,
        };

        Ok(Self {
            database_url,
            token_secret,
            stripe_secret_key,
            port,
            database_max_connections,
        })
    }
}
