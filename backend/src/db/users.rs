use crate::models::{NewUser, User, UserType};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

const USER_COLUMNS: &str = "id, email, password, name, phone, user_type, language, location, latitude, longitude, registration_date";

pub async fn create_user(pool: &SqlitePool, new_user: &NewUser) -> Result<User> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (email, password, name, phone, user_type, language, location, registration_date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(&new_user.name)
    .bind(&new_user.phone)
    .bind(new_user.user_type)
    .bind(&new_user.language)
    .bind(&new_user.location)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn get_user_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Every user on one side of the marketplace, alphabetical.
pub async fn list_users_by_type(pool: &SqlitePool, user_type: UserType) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE user_type = ? ORDER BY name, id"
    ))
    .bind(user_type)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Overwrites the stored address and coordinates. Last write wins.
pub async fn update_user_location(
    pool: &SqlitePool,
    user_id: i64,
    address: &str,
    latitude: f64,
    longitude: f64,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET location = ?, latitude = ?, longitude = ?
        WHERE id = ?
        "#,
    )
    .bind(address)
    .bind(latitude)
    .bind(longitude)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn update_user_language(pool: &SqlitePool, user_id: i64, language: &str) -> Result<()> {
    sqlx::query("UPDATE users SET language = ? WHERE id = ?")
        .bind(language)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}
