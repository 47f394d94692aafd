//! Database pool and data access operations

pub mod db;

// Re-exports for convenience
pub use self::db::{create_pool, DbPool};
