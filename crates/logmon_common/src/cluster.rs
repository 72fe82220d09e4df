//! Cluster transport - HTTP boundary to the search cluster
//!
//! Provides a narrow interface over the three requests the console issues
//! (root GET, index HEAD, index PUT). Supports a real reqwest implementation
//! and a scripted fake for testing.

use crate::error::{ConfigError, TransportError};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Minimal response seen by the probe and the provisioning workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterReply {
    pub status: u16,
    pub body: String,
}

impl ClusterReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200, "")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Index creation settings: one shard, no replicas
pub fn index_settings() -> Value {
    serde_json::json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 0
        }
    })
}

/// Requests issued against the search cluster
pub trait ClusterTransport: Send + Sync {
    /// GET on the cluster base URL
    fn ping(&self, timeout: Duration) -> Result<ClusterReply, TransportError>;

    /// HEAD on `{base}/{index}`
    fn head_index(&self, index: &str, timeout: Duration) -> Result<ClusterReply, TransportError>;

    /// PUT on `{base}/{index}` with a JSON body
    fn create_index(
        &self,
        index: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<ClusterReply, TransportError>;
}

/// Real transport using a blocking reqwest client
pub struct HttpClusterTransport {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpClusterTransport {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        reqwest::Url::parse(base_url).map_err(|e| ConfigError::ClusterUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn index_url(&self, index: &str) -> String {
        format!("{}/{}", self.base_url, index)
    }

    fn finish(response: reqwest::blocking::Response) -> Result<ClusterReply, TransportError> {
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(ClusterReply { status, body })
    }
}

impl ClusterTransport for HttpClusterTransport {
    fn ping(&self, timeout: Duration) -> Result<ClusterReply, TransportError> {
        debug!("GET {}", self.base_url);
        let response = self.client.get(&self.base_url).timeout(timeout).send()?;
        Self::finish(response)
    }

    fn head_index(&self, index: &str, timeout: Duration) -> Result<ClusterReply, TransportError> {
        let url = self.index_url(index);
        debug!("HEAD {}", url);
        let response = self.client.head(&url).timeout(timeout).send()?;
        Ok(ClusterReply::new(response.status().as_u16(), ""))
    }

    fn create_index(
        &self,
        index: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<ClusterReply, TransportError> {
        let url = self.index_url(index);
        debug!("PUT {}", url);
        let response = self.client.put(&url).json(body).timeout(timeout).send()?;
        Self::finish(response)
    }
}

/// Request recorded by [`FakeClusterTransport`]
#[derive(Debug, Clone, PartialEq)]
pub enum FakeCall {
    Ping,
    Head(String),
    Create(String, Value),
}

/// Fake transport for testing
///
/// Ping replies are consumed in order; the last one repeats. Head and create
/// replies are keyed by index name and default to HTTP 200.
pub struct FakeClusterTransport {
    pings: Mutex<VecDeque<Result<ClusterReply, TransportError>>>,
    heads: Mutex<HashMap<String, Result<ClusterReply, TransportError>>>,
    creates: Mutex<HashMap<String, Result<ClusterReply, TransportError>>>,
    calls: Mutex<Vec<FakeCall>>,
}

impl FakeClusterTransport {
    pub fn new(pings: Vec<Result<ClusterReply, TransportError>>) -> Self {
        Self {
            pings: Mutex::new(pings.into()),
            heads: Mutex::new(HashMap::new()),
            creates: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Cluster that answers every request with 200
    pub fn healthy() -> Self {
        Self::new(vec![Ok(ClusterReply::ok())])
    }

    /// Cluster that refuses every connection
    pub fn unreachable() -> Self {
        Self::new(vec![Err(TransportError::Connect(
            "connection refused".to_string(),
        ))])
    }

    /// Cluster that reports down `failures` times, then comes up
    pub fn up_after(failures: usize) -> Self {
        let mut pings: Vec<_> = (0..failures)
            .map(|_| Err(TransportError::Connect("connection refused".to_string())))
            .collect();
        pings.push(Ok(ClusterReply::ok()));
        Self::new(pings)
    }

    pub fn with_head(self, index: &str, reply: Result<ClusterReply, TransportError>) -> Self {
        self.heads
            .lock()
            .unwrap()
            .insert(index.to_string(), reply);
        self
    }

    pub fn with_create(self, index: &str, reply: Result<ClusterReply, TransportError>) -> Self {
        self.creates
            .lock()
            .unwrap()
            .insert(index.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ping_count(&self) -> usize {
        self.count(|c| matches!(c, FakeCall::Ping))
    }

    pub fn head_count(&self) -> usize {
        self.count(|c| matches!(c, FakeCall::Head(_)))
    }

    pub fn create_count(&self) -> usize {
        self.count(|c| matches!(c, FakeCall::Create(..)))
    }

    fn count(&self, pred: impl Fn(&FakeCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: FakeCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ClusterTransport for FakeClusterTransport {
    fn ping(&self, _timeout: Duration) -> Result<ClusterReply, TransportError> {
        self.record(FakeCall::Ping);
        let mut pings = self.pings.lock().unwrap();
        match pings.len() {
            0 => Err(TransportError::Other("no scripted reply".to_string())),
            1 => pings[0].clone(),
            _ => pings
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Other("no scripted reply".to_string()))),
        }
    }

    fn head_index(&self, index: &str, _timeout: Duration) -> Result<ClusterReply, TransportError> {
        self.record(FakeCall::Head(index.to_string()));
        self.heads
            .lock()
            .unwrap()
            .get(index)
            .cloned()
            .unwrap_or_else(|| Ok(ClusterReply::ok()))
    }

    fn create_index(
        &self,
        index: &str,
        body: &Value,
        _timeout: Duration,
    ) -> Result<ClusterReply, TransportError> {
        self.record(FakeCall::Create(index.to_string(), body.clone()));
        self.creates
            .lock()
            .unwrap()
            .get(index)
            .cloned()
            .unwrap_or_else(|| Ok(ClusterReply::ok()))
    }
}
