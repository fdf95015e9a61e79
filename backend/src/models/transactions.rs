use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: i64,
    pub crop_id: i64,
    pub buyer_id: i64,
    pub farmer_id: i64,
    pub quantity: f64,
    pub total_price: f64,
    pub status: String,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Crop {
    pub id: i64,
    pub farmer_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub price: f64,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub image_path: Option<String>,
}
