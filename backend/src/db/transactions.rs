use crate::models::{Crop, Transaction};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

const TRANSACTION_COLUMNS: &str = "id, crop_id, buyer_id, farmer_id, quantity, total_price, status, payment_id, created_at";

// Crop operations
pub async fn insert_crop(
    pool: &SqlitePool,
    farmer_id: i64,
    title: &str,
    quantity: f64,
    unit: &str,
    price: f64,
) -> Result<Crop> {
    let crop = sqlx::query_as::<_, Crop>(
        r#"
        INSERT INTO crops (farmer_id, title, quantity, unit, price, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, farmer_id, title, description, quantity, unit, price, location,
                  latitude, longitude, available, created_at, image_path
        "#,
    )
    .bind(farmer_id)
    .bind(title)
    .bind(quantity)
    .bind(unit)
    .bind(price)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(crop)
}

pub async fn get_crop_by_id(pool: &SqlitePool, crop_id: i64) -> Result<Option<Crop>> {
    let crop = sqlx::query_as::<_, Crop>(
        r#"
        SELECT id, farmer_id, title, description, quantity, unit, price, location,
               latitude, longitude, available, created_at, image_path
        FROM crops
        WHERE id = ?
        "#,
    )
    .bind(crop_id)
    .fetch_optional(pool)
    .await?;

    Ok(crop)
}

// Transaction operations
pub async fn create_transaction(
    pool: &SqlitePool,
    crop_id: i64,
    buyer_id: i64,
    farmer_id: i64,
    quantity: f64,
    total_price: f64,
    status: &str,
) -> Result<Transaction> {
    create_transaction_at(pool, crop_id, buyer_id, farmer_id, quantity, total_price, status, Utc::now()).await
}

#[allow(clippy::too_many_arguments)]
pub async fn create_transaction_at(
    pool: &SqlitePool,
    crop_id: i64,
    buyer_id: i64,
    farmer_id: i64,
    quantity: f64,
    total_price: f64,
    status: &str,
    created_at: DateTime<Utc>,
) -> Result<Transaction> {
    let transaction = sqlx::query_as::<_, Transaction>(&format!(
        r#"
        INSERT INTO transactions (crop_id, buyer_id, farmer_id, quantity, total_price, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING {TRANSACTION_COLUMNS}
        "#
    ))
    .bind(crop_id)
    .bind(buyer_id)
    .bind(farmer_id)
    .bind(quantity)
    .bind(total_price)
    .bind(status)
    .bind(created_at)
    .fetch_one(pool)
    .await?;

    Ok(transaction)
}

pub async fn update_payment_status(
    pool: &SqlitePool,
    transaction_id: i64,
    payment_id: &str,
    status: &str,
) -> Result<Option<Transaction>> {
    let transaction = sqlx::query_as::<_, Transaction>(&format!(
        r#"
        UPDATE transactions
        SET payment_id = ?, status = ?
        WHERE id = ?
        RETURNING {TRANSACTION_COLUMNS}
        "#
    ))
    .bind(payment_id)
    .bind(status)
    .bind(transaction_id)
    .fetch_optional(pool)
    .await?;

    Ok(transaction)
}
