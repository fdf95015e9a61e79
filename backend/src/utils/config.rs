use anyhow::Result;
use std::env;
use std::path::PathBuf;
use crate::constants::*;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub media_root: PathBuf,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    /// Unset means the translator is unavailable and every call passes through.
    pub translate_url: Option<String>,
    pub translate_api_key: Option<String>,
    pub http_timeout_secs: u64,
    pub session_idle_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid port number, got {}", raw))?,
            Err(_) => DEFAULT_SERVER_PORT,
        };

        Ok(Self {
            port,
            media_root: env::var("MEDIA_ROOT")
                .unwrap_or_else(|_| DEFAULT_MEDIA_ROOT.to_string())
                .into(),
            geocoder_url: env::var("GEOCODER_URL")
                .unwrap_or_else(|_| DEFAULT_GEOCODER_URL.to_string()),
            geocoder_user_agent: env::var("GEOCODER_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_GEOCODER_USER_AGENT.to_string()),
            translate_url: non_empty_var("TRANSLATE_URL"),
            translate_api_key: non_empty_var("TRANSLATE_API_KEY"),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            session_idle_timeout_secs: env::var("SESSION_IDLE_TIMEOUT_SECS")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(SESSION_IDLE_TIMEOUT_SECS),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
