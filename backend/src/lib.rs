pub mod chat;
pub mod constants;
pub mod db;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use db::connection::get_db_pool;
pub use handlers::{AppState, router};
pub use utils::config::Config;

// Re-export common types
pub use anyhow::Result;
pub use chrono::{DateTime, Utc};
pub use sqlx::SqlitePool;
