//! Bot initialization and outbound messaging
//!
//! This module contains:
//! - Bot instance creation
//! - Greeting composition for first-contact users
//! - The single outbound send: a greeting with a mini-app button

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, WebAppInfo};
use url::Url;

use crate::core::{config, AppResult};

/// Creates a Bot instance with an explicit request timeout
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Failed to build the underlying HTTP client
pub fn create_bot(token: &str) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    Ok(Bot::with_client(token, client))
}

/// Composes the salon greeting for a first-contact user.
///
/// The last name is appended only when Telegram supplied one.
pub fn booking_greeting(first_name: &str, last_name: Option<&str>) -> String {
    let mut message = format!("💅 Добро пожаловать в наш салон красоты, {first_name}");
    if let Some(last_name) = last_name {
        if !last_name.is_empty() {
            message.push(' ');
            message.push_str(last_name);
        }
    }
    message.push_str(
        "!\n\n✨ Забронируйте услугу маникюра или педикюра прямо сейчас, нажав на кнопку ниже. \
         Воспользуйтесь нашим мини-приложением, чтобы увидеть весь спектр услуг и удобное расписание.",
    );
    message
}

/// Sends the greeting with a single inline button opening the mini-app.
///
/// One outbound call per invocation, no idempotency guard: a retried
/// webhook delivery resends the greeting.
///
/// # Errors
/// Returns `AppError::Telegram` if the Telegram API call fails.
pub async fn send_booking_invitation(
    bot: &Bot,
    chat_id: ChatId,
    greeting: &str,
    web_app_url: Url,
) -> AppResult<()> {
    let keyboard = InlineKeyboardMarkup::new([[InlineKeyboardButton::web_app(
        "📅 Записаться",
        WebAppInfo { url: web_app_url },
    )]]);

    bot.send_message(chat_id, greeting).reply_markup(keyboard).await?;

    Ok(())
}
