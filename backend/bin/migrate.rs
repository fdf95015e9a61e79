use agroconnect::{utils, get_db_pool};
use agroconnect::db::DatabaseConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    tracing::info!("Running database migrations against {}", db_config.database_url);
    agroconnect::db::migrations::run_migrations(&pool).await?;
    tracing::info!("Migrations completed successfully");

    Ok(())
}
