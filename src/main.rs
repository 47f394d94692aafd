use anyhow::Result;
use dotenvy::dotenv;

use manikura::core::config::Config;
use manikura::storage::create_pool;
use manikura::telegram::{create_bot, webapp};

/// Main entry point for the booking backend
///
/// Wires configuration, the database pool, and the Telegram bot together,
/// then serves the HTTP API until shutdown.
///
/// # Errors
/// Returns an error if initialization fails (configuration, database, bot
/// creation) — all startup errors are fatal.
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    let _ = dotenv();

    pretty_env_logger::init();
    log::info!("Starting booking API service");

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let bot = create_bot(&config.bot_token)?;

    webapp::run_server(config.port, pool.clone(), bot, config.web_app_url).await?;

    // Drain pool connections before exit.
    pool.close().await;

    Ok(())
}
