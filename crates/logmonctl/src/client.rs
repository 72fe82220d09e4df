//! HTTP client for communicating with logmond.

use anyhow::{anyhow, Context, Result};
use logmon_common::{ClusterStatus, JobStatus, MonitorRule, ProvisionReport, RuleView};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on quick actions; index setup is bounded by the daemon instead
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the logmond JSON API
pub struct DaemonClient {
    base_url: String,
    http: reqwest::Client,
}

impl DaemonClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .timeout(REQUEST_TIMEOUT)
    }

    /// Send and decode, turning `{"error": ...}` bodies into errors
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            anyhow!(
                "Cannot reach logmond at {}: {}\n\nIs the daemon running?",
                self.base_url,
                e
            )
        })?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .with_context(|| format!("Invalid response from daemon (HTTP {})", status))?;

        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown error");
            return Err(anyhow!("HTTP {}: {}", status.as_u16(), message));
        }

        serde_json::from_value(body).context("Unexpected response shape from daemon")
    }

    pub async fn list(&self) -> Result<Vec<RuleView>> {
        self.send(self.request(Method::GET, "/v1/monitors")).await
    }

    pub async fn add(&self, rule: &MonitorRule) -> Result<serde_json::Value> {
        self.send(self.request(Method::POST, "/v1/monitors").json(rule))
            .await
    }

    pub async fn edit(&self, position: usize, rule: &MonitorRule) -> Result<serde_json::Value> {
        let path = format!("/v1/monitors/{}", position);
        self.send(self.request(Method::PUT, &path).json(rule)).await
    }

    pub async fn delete(&self, position: usize) -> Result<serde_json::Value> {
        let path = format!("/v1/monitors/{}", position);
        self.send(self.request(Method::DELETE, &path)).await
    }

    pub async fn status(&self) -> Result<ClusterStatus> {
        self.send(self.request(Method::GET, "/v1/status")).await
    }

    pub async fn setup_indexes(&self) -> Result<ProvisionReport> {
        let request = self.http.post(self.url("/v1/indexes/setup"));
        self.send(request).await
    }

    pub async fn trigger_job(&self) -> Result<JobStatus> {
        self.send(self.request(Method::POST, "/v1/job/trigger"))
            .await
    }
}
