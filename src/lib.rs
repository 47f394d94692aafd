//! Manikura - backend for a Telegram mini-app booking service
//!
//! This library provides the core functionality for the salon booking
//! backend: bot webhook ingestion, user persistence, and the read-only
//! HTTP API consumed by the mini-app front-end.
//!
//! # Module Structure
//!
//! - `core`: Configuration and error types
//! - `storage`: Database pool and data access operations
//! - `telegram`: Bot integration and the HTTP API surface

pub mod core;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{config::Config, AppError};
pub use crate::storage::{create_pool, db};
pub use crate::telegram::{create_bot, create_router};
