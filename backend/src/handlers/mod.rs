pub mod accounts;
pub mod chat;
pub mod contacts;
pub mod error;
pub mod marketplace;
pub mod session;
pub mod translate;

use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use sqlx::SqlitePool;
use std::time::Duration;

use crate::chat::SessionStore;
use crate::constants::MAX_UPLOAD_BYTES;
use crate::services::{geocoding::GeocodingService, media::MediaStore, translation::TranslationService};
use crate::utils::Config;

pub use error::ApiError;
pub use session::Session;

/// Shared handles every handler can reach.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub geocoder: GeocodingService,
    pub translator: TranslationService,
    pub media: MediaStore,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Result<Self> {
        Ok(Self {
            geocoder: GeocodingService::from_config(&config)?,
            translator: TranslationService::from_config(&config),
            media: MediaStore::new(config.media_root.clone()),
            sessions: SessionStore::new(Duration::from_secs(config.session_idle_timeout_secs)),
            pool,
            config,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Accounts
        .route("/api/users", post(accounts::register))
        .route("/api/sessions", post(accounts::login).delete(accounts::logout))
        .route("/api/me", get(accounts::me))
        .route("/api/me/location", put(accounts::update_location))
        .route("/api/me/language", put(accounts::update_language))
        // Contacts
        .route("/api/contacts", get(contacts::list_contacts))
        .route("/api/directory", get(contacts::directory))
        // Chat
        .route("/api/chat", get(chat::get_chat))
        .route("/api/chat/contact", put(chat::select_contact).delete(chat::clear_contact))
        .route(
            "/api/chat/attachments",
            post(chat::upload_attachment).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/chat/messages", post(chat::send_message))
        // Translation
        .route("/api/translate", post(translate::translate))
        .route("/api/detect", post(translate::detect))
        // Marketplace
        .route("/api/crops", post(marketplace::create_crop))
        .route("/api/transactions", post(marketplace::create_transaction))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dead_endpoint, test_pool};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct TestApp {
        app: Router,
        _media: tempfile::TempDir,
    }

    impl TestApp {
        async fn new() -> Self {
            let media = tempfile::tempdir().unwrap();
            let config = Config {
                port: 0,
                media_root: media.path().to_path_buf(),
                geocoder_url: dead_endpoint().await,
                geocoder_user_agent: "agroconnect-test".to_string(),
                translate_url: None,
                translate_api_key: None,
                http_timeout_secs: 2,
                session_idle_timeout_secs: 3600,
            };
            let state = AppState::new(test_pool().await, config).unwrap();
            Self { app: router(state), _media: media }
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.app.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, body)
        }

        async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            self.send(request).await
        }

        /// Registers and logs in, returning (user id, token).
        async fn sign_up(&self, email: &str, user_type: &str) -> (i64, String) {
            let (status, user) = self
                .call(
                    Method::POST,
                    "/api/users",
                    None,
                    Some(json!({
                        "email": email,
                        "password": "Kisan2024",
                        "name": email.split('@').next().unwrap(),
                        "user_type": user_type,
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{user}");

            let (status, login) = self
                .call(
                    Method::POST,
                    "/api/sessions",
                    None,
                    Some(json!({ "email": email, "password": "Kisan2024" })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            (user["id"].as_i64().unwrap(), login["token"].as_str().unwrap().to_string())
        }
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new().await;
        let response = app
            .app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_registration_and_login() {
        let app = TestApp::new().await;
        let (id, token) = app.sign_up("Meena@Example.com", "farmer").await;

        let (status, me) = app.call(Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], id);
        assert_eq!(me["email"], "meena@example.com");
        assert_eq!(me["language"], "en");
        assert!(me.get("password_hash").is_none());

        let (status, body) = app
            .call(
                Method::POST,
                "/api/users",
                None,
                Some(json!({
                    "email": "meena@example.com",
                    "password": "Another12",
                    "name": "Meena again",
                    "user_type": "buyer",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("already exists"));

        let (status, _) = app
            .call(
                Method::POST,
                "/api/sessions",
                None,
                Some(json!({ "email": "meena@example.com", "password": "wrong-password" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app.call(Method::DELETE, "/api/sessions", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app.call(Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    async fn register_status(app: &TestApp, overrides: Value) -> (StatusCode, Value) {
        let mut body = json!({
            "email": "asha@example.com",
            "password": "Kisan2024",
            "name": "Asha",
            "phone": "9876543210",
            "user_type": "buyer",
        });
        for (key, value) in overrides.as_object().unwrap() {
            body[key] = value.clone();
        }
        app.call(Method::POST, "/api/users", None, Some(body)).await
    }

    #[tokio::test]
    async fn test_register_rejects_malformed_email() {
        let app = TestApp::new().await;
        for email in ["asha", "asha@localhost", "asha @example.com"] {
            let (status, body) = register_status(&app, json!({ "email": email })).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{email}");
            assert_eq!(body["error"], "Enter a valid email address");
        }
    }

    #[tokio::test]
    async fn test_register_rejects_bad_phone() {
        let app = TestApp::new().await;
        for phone in ["12345", "98765-43210", "98765432101"] {
            let (status, body) = register_status(&app, json!({ "phone": phone })).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{phone}");
            assert_eq!(body["error"], "Phone number must be exactly 10 digits");
        }

        // Phone stays optional
        let (status, user) = register_status(&app, json!({ "phone": "  " })).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(user["phone"].is_null());
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let app = TestApp::new().await;
        let cases = [
            ("Kis2024", "at least 8 characters"),
            ("kisan2024", "uppercase"),
            ("KISAN2024", "lowercase"),
            ("KisanMandi", "digit"),
        ];
        for (password, reason) in cases {
            let (status, body) = register_status(&app, json!({ "password": password })).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{password}");
            assert!(body["error"].as_str().unwrap().contains(reason), "{body}");
        }
    }

    #[tokio::test]
    async fn test_register_requires_name() {
        let app = TestApp::new().await;
        let (status, body) = register_status(&app, json!({ "name": "   " })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Name is required");
    }

    #[tokio::test]
    async fn test_requires_session() {
        let app = TestApp::new().await;
        let (status, body) = app.call(Method::GET, "/api/contacts", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, _) = app
            .call(Method::GET, "/api/contacts", Some("not-a-token"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_message_makes_contact_with_unknown_distance() {
        let app = TestApp::new().await;
        let (farmer_id, farmer_token) = app.sign_up("farmer@example.com", "farmer").await;
        let (buyer_id, buyer_token) = app.sign_up("buyer@example.com", "buyer").await;

        // Buyer shares a location; the geocoder is down so the raw pair is stored
        let (status, buyer) = app
            .call(
                Method::PUT,
                "/api/me/location",
                Some(&buyer_token),
                Some(json!({ "latitude": 19.07, "longitude": 72.87 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(buyer["location"], "19.07, 72.87");

        let (_, contacts) = app.call(Method::GET, "/api/contacts", Some(&farmer_token), None).await;
        assert_eq!(contacts, json!([]));

        let (_, directory) = app.call(Method::GET, "/api/directory", Some(&farmer_token), None).await;
        assert_eq!(directory[0]["id"], buyer_id);

        let (status, view) = app
            .call(Method::PUT, "/api/chat/contact", Some(&farmer_token), Some(json!({ "contact_id": buyer_id })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["state"], "contact_selected");

        let (status, body) = app
            .call(Method::POST, "/api/chat/messages", Some(&farmer_token), Some(json!({ "text": "  " })))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].is_string());

        let (status, view) = app
            .call(
                Method::POST,
                "/api/chat/messages",
                Some(&farmer_token),
                Some(json!({ "text": "Onions ready next week" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["messages"][0]["direction"], "sent");
        assert_eq!(view["messages"][0]["translated_text"], "Onions ready next week");

        let (_, contacts) = app.call(Method::GET, "/api/contacts", Some(&farmer_token), None).await;
        assert_eq!(contacts[0]["id"], buyer_id);
        assert_eq!(contacts[0]["distance"], "unknown");
        assert_eq!(contacts[0]["transaction_count"], 0);

        let (_, contacts) = app.call(Method::GET, "/api/contacts", Some(&buyer_token), None).await;
        assert_eq!(contacts[0]["id"], farmer_id);

        // Chat state survives between requests
        let (_, view) = app.call(Method::GET, "/api/chat", Some(&farmer_token), None).await;
        assert_eq!(view["contact"]["id"], buyer_id);
        assert_eq!(view["messages"].as_array().unwrap().len(), 1);

        let (_, view) = app.call(Method::DELETE, "/api/chat/contact", Some(&farmer_token), None).await;
        assert_eq!(view["state"], "no_contact_selected");
    }

    #[tokio::test]
    async fn test_attachment_upload_and_send() {
        let app = TestApp::new().await;
        let (_, farmer_token) = app.sign_up("farmer@example.com", "farmer").await;
        let (buyer_id, _) = app.sign_up("buyer@example.com", "buyer").await;
        app.call(Method::PUT, "/api/chat/contact", Some(&farmer_token), Some(json!({ "contact_id": buyer_id })))
            .await;

        let boundary = "agroconnect-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"tomatoes.png\"\r\n\
             Content-Type: image/png\r\n\r\npng-bytes\r\n--{b}--\r\n",
            b = boundary
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/chat/attachments")
            .header(header::AUTHORIZATION, format!("Bearer {}", farmer_token))
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap();
        let (status, view) = app.send(request).await;
        assert_eq!(status, StatusCode::OK, "{view}");
        assert_eq!(view["state"], "composing");
        assert!(view["draft"]["image"].as_str().unwrap().ends_with("_tomatoes.png"));

        let (status, view) = app
            .call(Method::POST, "/api/chat/messages", Some(&farmer_token), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["messages"][0]["attachments"][0]["kind"], "image");
        assert!(view["messages"][0]["content"].as_str().unwrap().contains("class='message-image'"));
    }

    #[tokio::test]
    async fn test_purchase_creates_contact() {
        let app = TestApp::new().await;
        let (farmer_id, farmer_token) = app.sign_up("farmer@example.com", "farmer").await;
        let (buyer_id, buyer_token) = app.sign_up("buyer@example.com", "buyer").await;

        let (status, crop) = app
            .call(
                Method::POST,
                "/api/crops",
                Some(&farmer_token),
                Some(json!({ "title": "Turmeric", "quantity": 40.0, "unit": "kg", "price": 120.0 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = app
            .call(
                Method::POST,
                "/api/transactions",
                Some(&farmer_token),
                Some(json!({ "crop_id": crop["id"], "quantity": 1.0 })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .call(
                Method::POST,
                "/api/transactions",
                Some(&buyer_token),
                Some(json!({ "crop_id": crop["id"], "quantity": 400.0 })),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, tx) = app
            .call(
                Method::POST,
                "/api/transactions",
                Some(&buyer_token),
                Some(json!({ "crop_id": crop["id"], "quantity": 2.5 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(tx["farmer_id"], farmer_id);
        assert_eq!(tx["total_price"], 300.0);
        assert_eq!(tx["status"], "pending");

        let (_, contacts) = app.call(Method::GET, "/api/contacts", Some(&farmer_token), None).await;
        assert_eq!(contacts[0]["id"], buyer_id);
        assert_eq!(contacts[0]["transaction_count"], 1);
    }

    #[tokio::test]
    async fn test_language_and_translation_endpoints() {
        let app = TestApp::new().await;
        let (_, token) = app.sign_up("farmer@example.com", "farmer").await;

        let (status, user) = app
            .call(Method::PUT, "/api/me/language", Some(&token), Some(json!({ "language": "MR" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["language"], "mr");

        let (status, _) = app
            .call(Method::PUT, "/api/me/language", Some(&token), Some(json!({ "language": "fr" })))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = app
            .call(Method::PUT, "/api/me/location", Some(&token), Some(json!({ "latitude": 18.5 })))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        // No translator configured: passthrough
        let (status, body) = app
            .call(Method::POST, "/api/translate", None, Some(json!({ "text": "नमस्ते", "target": "en" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["translated_text"], "नमस्ते");

        let (_, body) = app
            .call(Method::POST, "/api/detect", None, Some(json!({ "text": "नमस्ते" })))
            .await;
        assert_eq!(body["language"], "en");
    }
}
