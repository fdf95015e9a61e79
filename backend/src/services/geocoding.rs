use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::utils::Config;

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

/// Reverse geocoder speaking the Nominatim `/reverse` API.
#[derive(Debug, Clone)]
pub struct GeocodingService {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl GeocodingService {
    pub fn new(base_url: String, user_agent: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.geocoder_url.clone(),
            config.geocoder_user_agent.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    /// Best-effort address for a coordinate pair; `"lat, lng"` on any failure.
    pub async fn reverse(&self, lat: f64, lng: f64) -> String {
        match self.lookup(lat, lng).await {
            Ok(Some(address)) => address,
            Ok(None) => {
                tracing::debug!("No address found for {}, {}", lat, lng);
                fallback_address(lat, lng)
            }
            Err(e) => {
                tracing::warn!("Reverse geocoding failed for {}, {}: {}", lat, lng, e);
                fallback_address(lat, lng)
            }
        }
    }

    async fn lookup(&self, lat: f64, lng: f64) -> Result<Option<String>> {
        let url = format!("{}/reverse", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: ReverseResponse = response.json().await?;
        if let Some(error) = body.error {
            return Err(anyhow::anyhow!("geocoder error: {}", error));
        }

        Ok(body.display_name.filter(|name| !name.trim().is_empty()))
    }
}

pub fn fallback_address(lat: f64, lng: f64) -> String {
    format!("{}, {}", lat, lng)
}
