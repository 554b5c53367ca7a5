use crate::{Plugin, PluginError};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use common::config::validate_endpoint;
use metrics::Sample;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// JSON body posted to the API endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiPayload {
    pub cpu: f64,
    pub ram_used: u64,
    pub disk_used: u64,
    pub ram_total: u64,
    pub disk_total: u64,
    /// RFC 3339 time at which the payload was built.
    pub timestamp: String,
}

impl ApiPayload {
    pub fn new(sample: &Sample, at: DateTime<Utc>) -> Self {
        Self {
            cpu: sample.cpu_usage_percent(),
            ram_used: sample.ram_used_mb(),
            disk_used: sample.disk_used_mb(),
            ram_total: sample.ram_total_mb(),
            disk_total: sample.disk_total_mb(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Posts every sample as JSON to a remote HTTP endpoint.
///
/// One attempt per sample, bounded by the configured request timeout. Transport
/// errors and non-2xx responses are returned as errors.
#[derive(Debug, Clone)]
pub struct ApiReporterPlugin {
    client: reqwest::Client,
    endpoint: Url,
}

impl ApiReporterPlugin {
    /// Build the reporter, validating `endpoint` up front so a bad URL fails at
    /// startup rather than on every tick.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, PluginError> {
        let endpoint = validate_endpoint(endpoint)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sysmon/", env!("CARGO_PKG_VERSION")))
            .build()?;

        debug!(%endpoint, ?timeout, "API reporter configured");
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Plugin for ApiReporterPlugin {
    #[inline]
    fn name(&self) -> String {
        "ApiReporterPlugin".to_string()
    }

    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn process(&self, sample: &Sample) -> anyhow::Result<()> {
        let payload = ApiPayload::new(sample, Utc::now());
        info!(?payload, "Sending metrics to API");

        let response = self
            .client
            .post(self.endpoint.as_str())
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Failed to send metrics to {}", self.endpoint))?;

        let status = response.status();
        debug!(%status, "API response");

        response
            .error_for_status()
            .with_context(|| format!("API {} rejected metrics", self.endpoint))?;

        Ok(())
    }
}
