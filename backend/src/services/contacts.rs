use anyhow::Result;
use sqlx::SqlitePool;

use crate::db::contacts::{InteractionRow, find_interacting_users};
use crate::models::{Contact, User};
use crate::services::distance::distance_km;

/// Counterparts the viewer has traded or chatted with, most recent first.
///
/// Farmers see buyers and buyers see farmers. `search` narrows the list by a
/// case-insensitive match on name or email.
pub async fn resolve_contacts(pool: &SqlitePool, viewer: &User, search: Option<&str>) -> Result<Vec<Contact>> {
    let rows = find_interacting_users(pool, viewer.id, viewer.user_type).await?;
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let contacts = rows
        .into_iter()
        .filter(|row| match &needle {
            Some(needle) => {
                row.name.to_lowercase().contains(needle) || row.email.to_lowercase().contains(needle)
            }
            None => true,
        })
        .map(|row| into_contact(viewer, row))
        .collect();

    Ok(contacts)
}

fn into_contact(viewer: &User, row: InteractionRow) -> Contact {
    let distance = distance_km(viewer.latitude, viewer.longitude, row.latitude, row.longitude);
    Contact {
        id: row.id,
        name: row.name,
        email: row.email,
        phone: row.phone,
        user_type: row.user_type,
        language: row.language,
        location: row.location,
        latitude: row.latitude,
        longitude: row.longitude,
        last_interaction: row.last_interaction,
        transaction_count: row.transaction_count,
        distance,
    }
}
