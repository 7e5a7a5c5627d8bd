//! HTTP transport: POSTs batches of events to a collector endpoint.

use super::TrackerTransport;
use crate::error::{Result, TrackerError};
use crate::event::{now_millis, TrackerEvent};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error};

pub const HTTP_TRANSPORT: &str = "HttpTransport";

/// Configuration for reaching a collector
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub endpoint: String,
    pub timeout: Option<Duration>,
    pub headers: HashMap<String, String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            endpoint: std::env::var("TRACKER_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            timeout: None,
            headers: HashMap::new(),
        }
    }
}

/// Sends every batch in a single request:
///
/// ```json
/// { "events": [ ... ], "transport_time": 1700000000000 }
/// ```
///
/// Any non-2xx answer rejects the whole batch.
pub struct HttpTransport {
    client: Option<Client>,
    config: HttpTransportConfig,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_config(HttpTransportConfig::default())
    }

    pub fn with_config(config: HttpTransportConfig) -> Self {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let client = match client_builder.build() {
            Ok(client) => Some(client),
            Err(e) => {
                error!("Could not build HTTP client, {} is unusable: {}", HTTP_TRANSPORT, e);
                None
            }
        };

        Self { client, config }
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self::with_config(HttpTransportConfig {
            endpoint: endpoint.into(),
            ..Default::default()
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrackerTransport for HttpTransport {
    fn transport_name(&self) -> &str {
        HTTP_TRANSPORT
    }

    fn is_usable(&self) -> bool {
        self.client.is_some()
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let client = self.client.as_ref().ok_or_else(|| {
            TrackerError::TransportUnusable(format!("{} has no HTTP client", HTTP_TRANSPORT))
        })?;

        let wire_events = events
            .iter()
            .map(TrackerEvent::to_wire)
            .collect::<Result<Vec<_>>>()?;

        let body = serde_json::json!({
            "events": wire_events,
            "transport_time": now_millis(),
        });

        debug!("Sending {} events to {}", events.len(), self.config.endpoint);

        let mut request = client.post(&self.config.endpoint).json(&body);
        for (name, value) in &self.config.headers {
            request = request.header(name, value);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(TrackerError::TransportError(format!(
                "Collector at {} answered {}",
                self.config.endpoint,
                response.status()
            )));
        }

        Ok(())
    }
}
