use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{APP_LANGUAGES, DEFAULT_LANGUAGE};
use crate::db::{self, is_unique_violation};
use crate::handlers::{AppState, error::ApiError, session::Session};
use crate::models::{NewUser, User, UserType};

const MIN_PASSWORD_LENGTH: usize = 8;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").unwrap());

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub user_type: UserType,
    pub language: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: String,
}

pub fn is_app_language(code: &str) -> bool {
    APP_LANGUAGES.iter().any(|(app_code, _)| *app_code == code)
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ApiError::validation("Password must contain at least one uppercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ApiError::validation("Password must contain at least one lowercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ApiError::validation("Password must contain at least one digit"));
    }
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let email = req.email.trim().to_lowercase();
    let name = req.name.trim().to_string();
    if !EMAIL_PATTERN.is_match(&email) {
        return Err(ApiError::validation("Enter a valid email address"));
    }
    if name.is_empty() {
        return Err(ApiError::validation("Name is required"));
    }
    let phone = req
        .phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    if let Some(phone) = &phone {
        if !PHONE_PATTERN.is_match(phone) {
            return Err(ApiError::validation("Phone number must be exactly 10 digits"));
        }
    }
    validate_password(&req.password)?;

    let language = req
        .language
        .map(|code| code.trim().to_lowercase())
        .filter(|code| is_app_language(code))
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    let new_user = NewUser {
        email,
        password_hash: hash_password(&req.password)?,
        name,
        phone,
        user_type: req.user_type,
        language,
        location: req.location.filter(|l| !l.trim().is_empty()),
    };

    match db::users::create_user(&state.pool, &new_user).await {
        Ok(user) => {
            tracing::info!("Registered {} {}", user.user_type, user.id);
            Ok((StatusCode::CREATED, Json(user)))
        }
        Err(e) if is_unique_violation(&e) => {
            Err(ApiError::Conflict("An account with this email already exists".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = req.email.trim().to_lowercase();
    let user = db::users::get_user_by_email(&state.pool, &email)
        .await?
        .filter(|user| verify_password(&req.password, &user.password_hash))
        .ok_or_else(|| {
            tracing::debug!("Failed login for {}", email);
            ApiError::Unauthorized
        })?;

    let session = state.sessions.create(user).await;
    Ok(Json(LoginResponse {
        token: session.token,
        user: session.user,
    }))
}

pub async fn logout(State(state): State<AppState>, Session(ctx): Session) -> StatusCode {
    state.sessions.remove(&ctx.token).await;
    StatusCode::NO_CONTENT
}

pub async fn me(Session(ctx): Session) -> Json<User> {
    Json(ctx.user.clone())
}

/// Stores the browser-reported position with a best-effort address.
pub async fn update_location(
    State(state): State<AppState>,
    Session(mut ctx): Session,
    Json(req): Json<LocationRequest>,
) -> Result<Json<User>, ApiError> {
    let (Some(lat), Some(lng)) = (req.latitude, req.longitude) else {
        return Err(ApiError::validation("Both latitude and longitude are required"));
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(ApiError::validation("Coordinates are out of range"));
    }

    let address = state.geocoder.reverse(lat, lng).await;
    db::users::update_user_location(&state.pool, ctx.user.id, &address, lat, lng).await?;

    ctx.user.location = Some(address);
    ctx.user.latitude = Some(lat);
    ctx.user.longitude = Some(lng);

    Ok(Json(ctx.user.clone()))
}

pub async fn update_language(
    State(state): State<AppState>,
    Session(mut ctx): Session,
    Json(req): Json<LanguageRequest>,
) -> Result<Json<User>, ApiError> {
    let language = req.language.trim().to_lowercase();
    if !is_app_language(&language) {
        return Err(ApiError::validation(format!("Unsupported language: {}", req.language)));
    }

    db::users::update_user_language(&state.pool, ctx.user.id, &language).await?;
    ctx.user.language = language;

    Ok(Json(ctx.user.clone()))
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("Kisan2024").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Kisan2024", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("Kisan2024", "not-a-hash"));
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("Kisan2024").is_ok());
        for weak in ["Kis2024", "kisan2024", "KISAN2024", "KisanMandi"] {
            assert!(matches!(validate_password(weak), Err(ApiError::Validation(_))), "{weak}");
        }
    }

    #[test]
    fn test_email_and_phone_patterns() {
        assert!(EMAIL_PATTERN.is_match("ravi.patil+mandi@krishi.co.in"));
        assert!(!EMAIL_PATTERN.is_match("ravi@localhost"));
        assert!(!EMAIL_PATTERN.is_match("@krishi.in"));
        assert!(PHONE_PATTERN.is_match("9876543210"));
        assert!(!PHONE_PATTERN.is_match("98765 43210"));
        assert!(!PHONE_PATTERN.is_match("98765432101"));
    }

    #[test]
    fn test_app_languages() {
        assert!(is_app_language("or"));
        assert!(is_app_language("en"));
        assert!(!is_app_language("fr"));
    }
}
