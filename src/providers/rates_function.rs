use crate::core::config::RatesProviderConfig;
use crate::core::rates::{RatePayload, RateSource};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for the hosted `exchange-rates` backend function.
pub struct RatesFunctionProvider {
    url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl RatesFunctionProvider {
    pub fn new(config: &RatesProviderConfig) -> Result<Self> {
        let url = format!(
            "{}/functions/v1/{}",
            config.base_url.trim_end_matches('/'),
            config.function
        );
        let client = reqwest::Client::builder()
            .user_agent("hunian/0.1")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            url,
            api_key: config.api_key.clone(),
            client,
        })
    }
}

#[async_trait]
impl RateSource for RatesFunctionProvider {
    #[instrument(name = "RatesFunctionFetch", skip(self), fields(url = %self.url))]
    async fn fetch_rates(&self) -> Result<RatePayload> {
        debug!("Requesting exchange rates from {}", self.url);

        let mut request = self.client.post(&self.url).json(&serde_json::json!({}));
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for URL: {}", e, self.url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} from rates function",
                response.status()
            ));
        }

        let text = response
            .text()
            .await
            .context("Failed to read rates function response")?;
        if text.trim().is_empty() {
            return Err(anyhow!("Received empty response from rates function"));
        }

        let payload: RatePayload = serde_json::from_str(&text).with_context(|| {
            format!("Failed to parse rates function response. Response: '{text}'")
        })?;

        debug!(
            cached = payload.cached,
            fallback = payload.fallback,
            "Received exchange rates"
        );
        Ok(payload)
    }
}
