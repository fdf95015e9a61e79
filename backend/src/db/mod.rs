pub mod connection;
pub mod contacts;
pub mod messages;
pub mod migrations;
pub mod transactions;
pub mod users;

pub use connection::{get_db_pool, DatabaseConfig};

/// True when the error came from a UNIQUE constraint (e.g. a taken email).
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}
