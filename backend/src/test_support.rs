//! Fixtures shared by the unit tests.

use axum::Router;
use sqlx::SqlitePool;

use crate::db;
use crate::models::{NewUser, User, UserType};

pub async fn test_pool() -> SqlitePool {
    db::connection::memory_pool().await
}

pub fn new_user(email: &str, user_type: UserType) -> NewUser {
    NewUser {
        email: email.to_string(),
        password_hash: "hash".to_string(),
        name: email.split('@').next().unwrap_or(email).to_string(),
        phone: None,
        user_type,
        language: "en".to_string(),
        location: None,
    }
}

pub async fn create_test_user(pool: &SqlitePool, email: &str, user_type: UserType) -> User {
    db::users::create_user(pool, &new_user(email, user_type)).await.unwrap()
}

pub async fn set_coordinates(pool: &SqlitePool, user: &User, lat: f64, lng: f64) -> User {
    db::users::update_user_location(pool, user.id, "somewhere", lat, lng).await.unwrap();
    db::users::get_user_by_id(pool, user.id).await.unwrap().unwrap()
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nothing is listening on.
pub async fn dead_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
