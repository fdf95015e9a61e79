use agroconnect::db::DatabaseConfig;
use agroconnect::{get_db_pool, utils};
use anyhow::Result;
use chrono::Utc;
use clap::{Arg, Command};
use std::fs;
use std::path::Path;
use tracing::info;

const TABLES: [&str; 5] = ["users", "crops", "transactions", "contracts", "messages"];

#[tokio::main]
async fn main() -> Result<()> {
    utils::init_logging();

    let matches = Command::new("backup-db")
        .about("Write a consistent snapshot of the SQLite database")
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .short('o')
                .help("Output directory for backup files")
                .default_value("./db_backups"),
        )
        .get_matches();

    let output_dir = matches
        .get_one::<String>("output-dir")
        .map(String::as_str)
        .unwrap_or("./db_backups");

    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    fs::create_dir_all(output_dir)?;
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_file = Path::new(output_dir).join(format!("agroconnect_{}.db", timestamp));
    if backup_file.exists() {
        anyhow::bail!("Backup file {} already exists", backup_file.display());
    }

    info!("Creating snapshot at {}", backup_file.display());
    sqlx::query("VACUUM INTO ?")
        .bind(backup_file.to_string_lossy().to_string())
        .execute(&pool)
        .await?;

    for table in TABLES {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&pool)
            .await?;
        info!("  {}: {} rows", table, count);
    }

    let size = fs::metadata(&backup_file)?.len();
    info!("Database backup complete ({} bytes)", size);

    Ok(())
}
