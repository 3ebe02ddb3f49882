// Backend HTTP client: one-shot registration and metric delivery with
// bounded constant-delay retry.

use std::time::Duration;

use reqwest::Client;
use tracing::{error, info, warn};

use crate::error::{CollectorError, DeliveryError};
use crate::models::{ApiResponse, Identity, MetricSample, ServerId};

/// Per-request timeout for both endpoints.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Announce the host and obtain its durable id. Attempted exactly once:
    /// retry policy belongs to the caller, and the run loop has none for
    /// registration.
    pub async fn register(
        &self,
        path: &str,
        identity: &Identity,
    ) -> Result<ServerId, CollectorError> {
        let url = self.endpoint(path);
        info!(name = %identity.name, url = %url, "registering with backend");

        let response = self
            .client
            .post(&url)
            .json(identity)
            .send()
            .await
            .map_err(|e| CollectorError::RegistrationFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollectorError::RegistrationFailed(format!(
                "backend returned HTTP {status}"
            )));
        }

        let body: ApiResponse = response.json().await.map_err(|e| {
            CollectorError::RegistrationFailed(format!("unparseable response body: {e}"))
        })?;
        if !body.success {
            return Err(CollectorError::RegistrationFailed(
                body.error.unwrap_or_else(|| "backend reported failure".into()),
            ));
        }
        body.server_id()
            .ok_or_else(|| CollectorError::RegistrationFailed("response data has no id".into()))
    }

    /// Single delivery attempt.
    async fn send_sample(&self, path: &str, sample: &MetricSample) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(sample)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status));
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::BadBody(e.to_string()))?;
        if !body.success {
            return Err(DeliveryError::Rejected(
                body.error.unwrap_or_else(|| "no reason given".into()),
            ));
        }
        Ok(())
    }

    /// Up to `attempts` sequential deliveries with a constant `delay` between
    /// failures. True on the first success; false once attempts are
    /// exhausted. Never errors: a lost cycle only affects logs.
    pub async fn deliver(
        &self,
        path: &str,
        sample: &MetricSample,
        attempts: u32,
        delay: Duration,
    ) -> bool {
        for attempt in 1..=attempts {
            match self.send_sample(path, sample).await {
                Ok(()) => {
                    info!(
                        cpu_percent = sample.cpu_percent,
                        ram_percent = sample.ram_percent,
                        "metrics sent"
                    );
                    return true;
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        attempt,
                        attempts,
                        operation = "send_sample",
                        "delivery attempt failed"
                    );
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        error!(attempts, "failed to deliver metrics after all retry attempts");
        false
    }
}
