use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::constants::DEFAULT_TRANSACTION_STATUS;
use crate::db;
use crate::handlers::{AppState, error::ApiError, session::Session};
use crate::models::{Crop, Transaction, UserType};

#[derive(Debug, Deserialize)]
pub struct CreateCropRequest {
    pub title: String,
    pub quantity: f64,
    pub unit: String,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub crop_id: i64,
    pub quantity: f64,
}

pub async fn create_crop(
    State(state): State<AppState>,
    Session(ctx): Session,
    Json(req): Json<CreateCropRequest>,
) -> Result<(StatusCode, Json<Crop>), ApiError> {
    if ctx.user.user_type != UserType::Farmer {
        return Err(ApiError::Forbidden("Only farmers can list crops".to_string()));
    }
    let title = req.title.trim();
    if title.is_empty() || req.unit.trim().is_empty() {
        return Err(ApiError::validation("Title and unit are required"));
    }
    if !(req.quantity > 0.0) || !(req.price > 0.0) {
        return Err(ApiError::validation("Quantity and price must be positive"));
    }

    let crop = db::transactions::insert_crop(
        &state.pool,
        ctx.user.id,
        title,
        req.quantity,
        req.unit.trim(),
        req.price,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(crop)))
}

/// Records a pending purchase; the crop's owner is the farmer side.
pub async fn create_transaction(
    State(state): State<AppState>,
    Session(ctx): Session,
    Json(req): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    if ctx.user.user_type != UserType::Buyer {
        return Err(ApiError::Forbidden("Only buyers can purchase crops".to_string()));
    }
    let crop = db::transactions::get_crop_by_id(&state.pool, req.crop_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Crop {} not found", req.crop_id)))?;
    if !crop.available {
        return Err(ApiError::validation("This crop is no longer available"));
    }
    if !(req.quantity > 0.0) || req.quantity > crop.quantity {
        return Err(ApiError::validation(format!(
            "Quantity must be between 0 and {} {}",
            crop.quantity, crop.unit
        )));
    }

    let transaction = db::transactions::create_transaction(
        &state.pool,
        crop.id,
        ctx.user.id,
        crop.farmer_id,
        req.quantity,
        req.quantity * crop.price,
        DEFAULT_TRANSACTION_STATUS,
    )
    .await?;
    tracing::info!(
        "Buyer {} opened transaction {} with farmer {}",
        ctx.user.id,
        transaction.id,
        crop.farmer_id
    );

    Ok((StatusCode::CREATED, Json(transaction)))
}
