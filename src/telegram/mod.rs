//! Telegram bot integration and the HTTP API surface

pub mod bot;
pub mod webapp;

pub use self::bot::{booking_greeting, create_bot, send_booking_invitation};
pub use self::webapp::{create_router, run_server, WebAppState};
