use std::env;
use std::time::Duration;

use url::Url;

use crate::core::error::AppError;

/// Default listen port when PORT is not set
pub const DEFAULT_PORT: u16 = 3000;

/// Network timeout configuration
pub mod network {
    use super::Duration;

    /// Timeout for outbound Telegram API calls (in seconds)
    pub const TIMEOUT_SECS: u64 = 30;

    /// Timeout applied to every inbound HTTP request (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Outbound call timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(TIMEOUT_SECS)
    }

    /// Inbound request timeout duration
    pub fn request_timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Database pool configuration
pub mod database {
    use super::Duration;

    /// Maximum number of connections in the pool
    pub const MAX_CONNECTIONS: u32 = 10;

    /// Timeout for acquiring a connection from the pool (in seconds)
    pub const ACQUIRE_TIMEOUT_SECS: u64 = 5;

    /// Connection acquire timeout duration
    pub fn acquire_timeout() -> Duration {
        Duration::from_secs(ACQUIRE_TIMEOUT_SECS)
    }
}

/// Runtime configuration collected from environment variables at startup.
///
/// All required variables are read once in [`Config::from_env`]; a missing
/// one is fatal. The struct is passed down explicitly instead of living in
/// process-wide statics so the wiring stays visible and testable.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string (`DATABASE_URL`)
    pub database_url: String,
    /// Telegram Bot API token (`TELEGRAM_BOT_TOKEN`)
    pub bot_token: String,
    /// Entry point of the mini-app front-end (`TELEGRAM_WEB_APP_URL`)
    pub web_app_url: Url,
    /// Listen port (`PORT`, defaults to 3000)
    pub port: u16,
}

impl Config {
    /// Reads configuration from the environment.
    ///
    /// # Errors
    /// Returns `AppError::Config` if a required variable is absent or the
    /// port/web-app URL fail to parse.
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = require_var("DATABASE_URL")?;
        let bot_token = require_var("TELEGRAM_BOT_TOKEN")?;
        let web_app_url = Url::parse(&require_var("TELEGRAM_WEB_APP_URL")?)?;

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::Config(format!("PORT is not a valid port number: {raw}")))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            database_url,
            bot_token,
            web_app_url,
            port,
        })
    }
}

fn require_var(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Config(format!("{name} is not set")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn set_required_vars() {
        env::set_var("DATABASE_URL", "postgres://localhost/manikura");
        env::set_var("TELEGRAM_BOT_TOKEN", "123456:TEST");
        env::set_var("TELEGRAM_WEB_APP_URL", "https://app.example.com");
    }

    #[test]
    #[serial]
    fn from_env_defaults_port() {
        set_required_vars();
        env::remove_var("PORT");

        let config = Config::from_env().unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.web_app_url.as_str(), "https://app.example.com/");
    }

    #[test]
    #[serial]
    fn from_env_honours_port_override() {
        set_required_vars();
        env::set_var("PORT", "8081");

        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 8081);

        env::remove_var("PORT");
    }

    #[test]
    #[serial]
    fn from_env_fails_without_bot_token() {
        set_required_vars();
        env::remove_var("TELEGRAM_BOT_TOKEN");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    #[serial]
    fn from_env_rejects_bad_port() {
        set_required_vars();
        env::set_var("PORT", "not-a-port");

        assert!(Config::from_env().is_err());

        env::remove_var("PORT");
    }
}
