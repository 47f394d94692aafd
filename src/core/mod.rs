//! Configuration, errors, and common utilities

pub mod config;
pub mod error;

pub use self::error::{AppError, AppResult};
