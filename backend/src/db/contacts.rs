use crate::constants::INTERACTION_TRANSACTION_STATUSES;
use crate::models::UserType;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

/// A counterpart user together with the interaction summary for the pair.
#[derive(Debug, Clone, FromRow)]
pub struct InteractionRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub user_type: UserType,
    pub language: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub transaction_count: i64,
    pub last_interaction: DateTime<Utc>,
}

/// Users of the counterpart type who share a counted transaction or any
/// message with `viewer_id`, most recent interaction first.
pub async fn find_interacting_users(
    pool: &SqlitePool,
    viewer_id: i64,
    viewer_type: UserType,
) -> Result<Vec<InteractionRow>> {
    let (viewer_column, counterpart_column) = match viewer_type {
        UserType::Farmer => ("farmer_id", "buyer_id"),
        UserType::Buyer => ("buyer_id", "farmer_id"),
    };
    let statuses = INTERACTION_TRANSACTION_STATUSES
        .iter()
        .map(|status| format!("'{status}'"))
        .collect::<Vec<_>>()
        .join(", ");

    let query = format!(
        r#"
        WITH tx AS (
            SELECT {counterpart_column} AS user_id,
                   COUNT(*) AS transaction_count,
                   MAX(created_at) AS last_tx
            FROM transactions
            WHERE {viewer_column} = ?1 AND status IN ({statuses})
            GROUP BY {counterpart_column}
        ),
        msg AS (
            SELECT CASE WHEN sender_id = ?1 THEN receiver_id ELSE sender_id END AS user_id,
                   MAX(created_at) AS last_msg
            FROM messages
            WHERE sender_id = ?1 OR receiver_id = ?1
            GROUP BY 1
        )
        SELECT u.id, u.name, u.email, u.phone, u.user_type, u.language, u.location,
               u.latitude, u.longitude,
               COALESCE(tx.transaction_count, 0) AS transaction_count,
               CASE
                   WHEN msg.last_msg IS NULL THEN tx.last_tx
                   WHEN tx.last_tx IS NULL THEN msg.last_msg
                   WHEN tx.last_tx > msg.last_msg THEN tx.last_tx
                   ELSE msg.last_msg
               END AS last_interaction
        FROM users u
        LEFT JOIN tx ON tx.user_id = u.id
        LEFT JOIN msg ON msg.user_id = u.id
        WHERE u.user_type = ?2
          AND u.id != ?1
          AND (tx.user_id IS NOT NULL OR msg.user_id IS NOT NULL)
        ORDER BY last_interaction DESC, u.id ASC
        "#
    );

    let rows = sqlx::query_as::<_, InteractionRow>(&query)
        .bind(viewer_id)
        .bind(viewer_type.counterpart())
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
