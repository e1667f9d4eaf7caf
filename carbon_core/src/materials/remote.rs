//! HTTP coefficient provider for native builds.
//!
//! Queries an EPD-style coefficient service:
//!
//! ```text
//! GET {base_url}/coefficients/{category}/{type}
//! 200 → { "rate": 320.0, "unit": "m3", "biogenic_storage": null, "confidence": "high" }
//! ```

use std::time::Duration;

use async_trait::async_trait;

use super::{CarbonCoefficient, CoefficientProvider, MaterialKey};
use crate::errors::{CarbonError, CarbonResult};

/// Current library version (from Cargo.toml)
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub struct HttpCoefficientProvider {
    name: String,
    base_url: String,
    client: reqwest::Client,
}

impl HttpCoefficientProvider {
    /// Create a provider for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> CarbonResult<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> CarbonResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let client = reqwest::Client::builder()
            .user_agent(format!("CarbonCore/{}", CURRENT_VERSION))
            .timeout(timeout)
            .build()
            .map_err(|e| CarbonError::provider_failed(&base_url, format!("Failed to create HTTP client: {}", e)))?;

        Ok(HttpCoefficientProvider {
            name: base_url.clone(),
            base_url,
            client,
        })
    }

    fn url_for(&self, key: &MaterialKey) -> String {
        format!(
            "{}/coefficients/{}/{}",
            self.base_url,
            key.category.code(),
            key.material_type
        )
    }
}

#[async_trait]
impl CoefficientProvider for HttpCoefficientProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, key: &MaterialKey) -> CarbonResult<CarbonCoefficient> {
        let url = self.url_for(key);
        tracing::debug!(%url, "fetching coefficient");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CarbonError::provider_failed(&self.name, format!("Network error: {}", e)))?;

        if !response.status().is_success() {
            return Err(CarbonError::provider_failed(
                &self.name,
                format!("{} returned {}", url, response.status()),
            ));
        }

        let coefficient: CarbonCoefficient = response
            .json()
            .await
            .map_err(|e| CarbonError::provider_failed(&self.name, format!("Failed to parse response: {}", e)))?;

        coefficient
            .validate(key)
            .map_err(|e| CarbonError::provider_failed(&self.name, e.to_string()))?;

        Ok(coefficient)
    }
}
