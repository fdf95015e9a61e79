use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{DEFAULT_LANGUAGE, SUPPORTED_TRANSLATION_LANGUAGES};
use crate::models::Message;
use crate::utils::Config;

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
}

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    language: String,
    #[serde(default)]
    confidence: f64,
}

/// A message with its content rendered for one reader's language.
#[derive(Debug, Clone, Serialize)]
pub struct TranslatedMessage {
    #[serde(flatten)]
    pub message: Message,
    pub translated_content: String,
}

#[derive(Debug, Clone)]
struct Backend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

/// Best-effort translation against a LibreTranslate-compatible service.
///
/// Nothing here returns an error: when the backend is missing or a call
/// fails the caller gets the original text back (or `"en"` for detection).
#[derive(Debug, Clone)]
pub struct TranslationService {
    backend: Option<Backend>,
}

impl TranslationService {
    pub fn new(base_url: Option<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let Some(base_url) = base_url else {
            tracing::info!("No translation service configured, messages will not be translated");
            return Self::unavailable();
        };

        match Client::builder().timeout(timeout).build() {
            Ok(client) => Self {
                backend: Some(Backend {
                    client,
                    base_url: base_url.trim_end_matches('/').to_string(),
                    api_key,
                }),
            },
            Err(e) => {
                tracing::warn!("Failed to initialize translation client: {}", e);
                Self::unavailable()
            }
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.translate_url.clone(),
            config.translate_api_key.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    pub fn unavailable() -> Self {
        Self { backend: None }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn translate(&self, text: &str, target_language: &str, source_language: Option<&str>) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }
        let Some(backend) = &self.backend else {
            return text.to_string();
        };

        let target = target_language.trim().to_lowercase();
        // English readers get ASCII text as-is
        if target == DEFAULT_LANGUAGE && text.is_ascii() {
            return text.to_string();
        }
        if !is_supported_language(&target) {
            return text.to_string();
        }

        let source = source_language
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "auto".to_string());

        match backend.translate(text, &source, &target).await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!("Translation error ({} -> {}): {}", source, target, e);
                text.to_string()
            }
        }
    }

    pub async fn detect(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return DEFAULT_LANGUAGE.to_string();
        }
        let Some(backend) = &self.backend else {
            return DEFAULT_LANGUAGE.to_string();
        };

        match backend.detect(text).await {
            Ok(Some(language)) => language,
            Ok(None) => DEFAULT_LANGUAGE.to_string(),
            Err(e) => {
                tracing::warn!("Language detection error: {}", e);
                DEFAULT_LANGUAGE.to_string()
            }
        }
    }

    /// Pairs every message with its content in `target_language`.
    pub async fn translate_messages(&self, messages: Vec<Message>, target_language: &str) -> Vec<TranslatedMessage> {
        let mut translated = Vec::with_capacity(messages.len());
        for message in messages {
            let translated_content = if !self.is_available()
                || message.content.is_empty()
                || message.original_language == target_language
            {
                message.content.clone()
            } else {
                self.translate(&message.content, target_language, Some(&message.original_language))
                    .await
            };
            translated.push(TranslatedMessage {
                message,
                translated_content,
            });
        }
        translated
    }
}

impl Backend {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let request = TranslateRequest {
            q: text,
            source,
            target,
            format: "text",
            api_key: self.api_key.as_deref(),
        };
        let response: TranslateResponse = self
            .client
            .post(format!("{}/translate", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.translated_text)
    }

    async fn detect(&self, text: &str) -> Result<Option<String>> {
        let request = DetectRequest {
            q: text,
            api_key: self.api_key.as_deref(),
        };
        let detections: Vec<Detection> = self
            .client
            .post(format!("{}/detect", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(detections
            .into_iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .map(|d| d.language)
            .filter(|language| !language.is_empty()))
    }
}

pub fn is_supported_language(code: &str) -> bool {
    SUPPORTED_TRANSLATION_LANGUAGES.contains(&code)
}

/// A user's preferred language if the translator can target it, else `"en"`.
pub fn language_or_default(code: &str) -> String {
    let code = code.trim().to_lowercase();
    if is_supported_language(&code) {
        code
    } else {
        DEFAULT_LANGUAGE.to_string()
    }
}
