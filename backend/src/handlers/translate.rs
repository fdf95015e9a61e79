use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LANGUAGE;
use crate::handlers::AppState;

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    #[serde(default = "default_target")]
    pub target: String,
    pub source: Option<String>,
}

fn default_target() -> String {
    DEFAULT_LANGUAGE.to_string()
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translated_text: String,
}

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub language: String,
}

// Both endpoints always succeed; failures come back as the input / "en".
pub async fn translate(
    State(state): State<AppState>,
    Json(req): Json<TranslateRequest>,
) -> Json<TranslateResponse> {
    let translated_text = state
        .translator
        .translate(&req.text, &req.target, req.source.as_deref())
        .await;
    Json(TranslateResponse { translated_text })
}

pub async fn detect(
    State(state): State<AppState>,
    Json(req): Json<DetectRequest>,
) -> Json<DetectResponse> {
    Json(DetectResponse {
        language: state.translator.detect(&req.text).await,
    })
}
