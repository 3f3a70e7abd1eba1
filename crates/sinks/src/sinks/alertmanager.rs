//! Alertmanager sink.
//!
//! Turns dangerous cluster events into Prometheus-style alerts and POSTs
//! them to an Alertmanager endpoint. Events are filtered by severity and
//! reason, and an event seen within the suppression window is not sent
//! again.
//!
//! ```text
//! alertmanager:http://alertmanager:9093/api/v1/alerts?cluster=prod&level=Warning
//! ```
//!
//! | option     | required | meaning                                               |
//! |------------|----------|-------------------------------------------------------|
//! | `cluster`  | yes      | value of the `cluster` label                          |
//! | `level`    | no       | minimum event type to forward (`Warning` by default)  |
//! | `ignore`   | no       | reasons never forwarded (replaces `Unhealthy`)        |
//! | `delivery` | no       | `batch` (one POST per export) or `event`              |

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tracing::{debug, error, info, warn};

use crate::alert::Alert;
use crate::dedup::{DedupCache, Fingerprint};
use crate::error::{DeliveryError, SinkError, SinkResult};
use crate::event::{severity_score, Event, EventBatch, SEVERITY_WARNING};
use crate::sink::EventSink;
use crate::uri::SinkUri;

/// Name of the Alertmanager sink kind.
pub const ALERTMANAGER_SINK: &str = "alertmanager";

const CONTENT_TYPE_JSON: &str = "application/json";

/// Reasons that are dropped unless the `ignore` option says otherwise.
pub const DEFAULT_IGNORED_REASONS: &[&str] = &["Unhealthy"];

/// How accumulated alerts are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// One request carrying every alert of the batch
    #[default]
    Batch,
    /// One request per alert
    PerEvent,
}

impl DeliveryMode {
    fn parse(value: &str) -> SinkResult<Self> {
        match value {
            "batch" => Ok(Self::Batch),
            "event" => Ok(Self::PerEvent),
            other => Err(SinkError::InvalidOption {
                option: "delivery",
                value: other.to_string(),
            }),
        }
    }
}

/// Settings captured when the sink is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertmanagerConfig {
    /// `host[:port][path]` alerts are POSTed to
    pub endpoint: String,
    /// Value of the `cluster` label
    pub cluster: String,
    /// Minimum severity score forwarded
    pub level: u8,
    /// Event reasons that never produce an alert
    pub ignored_reasons: Vec<String>,
    pub delivery: DeliveryMode,
}

impl AlertmanagerConfig {
    /// Config with default level, ignore list and delivery mode.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            cluster: cluster.into(),
            level: SEVERITY_WARNING,
            ignored_reasons: DEFAULT_IGNORED_REASONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            delivery: DeliveryMode::default(),
        }
    }

    /// Read the config from a sink specification.
    pub fn from_uri(uri: &SinkUri) -> SinkResult<Self> {
        let endpoint = uri.endpoint().ok_or(SinkError::MissingOption("host"))?;

        let cluster = uri
            .query("cluster")
            .filter(|c| !c.is_empty())
            .ok_or(SinkError::MissingOption("cluster"))?;

        let mut config = Self::new(endpoint, cluster);

        if let Some(level) = uri.query("level") {
            config.level = severity_score(&level);
        }

        let ignore = uri.query_all("ignore");
        if !ignore.is_empty() {
            config.ignored_reasons = ignore
                .iter()
                .flat_map(|v| v.split(','))
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(ToString::to_string)
                .collect();
        }

        if let Some(delivery) = uri.query("delivery") {
            config.delivery = DeliveryMode::parse(&delivery)?;
        }

        Ok(config)
    }

    /// Full URL alerts are POSTed to.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.endpoint)
    }
}

/// Sink that forwards events to Alertmanager.
pub struct AlertmanagerSink {
    config: AlertmanagerConfig,
    cache: Arc<DedupCache>,
    client: reqwest::Client,
}

impl AlertmanagerSink {
    /// Create a sink with its own suppression cache.
    #[must_use]
    pub fn new(config: AlertmanagerConfig) -> Self {
        Self::with_cache(config, Arc::new(DedupCache::default()))
    }

    /// Create a sink that records sent alerts in `cache`.
    #[must_use]
    pub fn with_cache(config: AlertmanagerConfig, cache: Arc<DedupCache>) -> Self {
        Self {
            config,
            cache,
            client: reqwest::Client::new(),
        }
    }

    /// Build a sink from a sink specification.
    pub fn from_uri(uri: &SinkUri) -> SinkResult<Self> {
        let config = AlertmanagerConfig::from_uri(uri)?;
        info!(
            sink = ALERTMANAGER_SINK,
            endpoint = %config.endpoint,
            cluster = %config.cluster,
            level = config.level,
            "Alertmanager sink configured"
        );
        Ok(Self::new(config))
    }

    #[must_use]
    pub fn config(&self) -> &AlertmanagerConfig {
        &self.config
    }

    fn is_dangerous(&self, event: &Event) -> bool {
        event.severity_score() >= self.config.level
    }

    fn is_ignored(&self, event: &Event) -> bool {
        self.config
            .ignored_reasons
            .iter()
            .any(|reason| *reason == event.reason)
    }

    /// Run the filters over `batch` and build alerts for what survives.
    async fn collect_alerts(&self, batch: &EventBatch) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for event in batch {
            if !self.is_dangerous(event) {
                continue;
            }

            if self.is_ignored(event) {
                info!(
                    sink = ALERTMANAGER_SINK,
                    reason = %event.reason,
                    name = %event.name,
                    "Skipping alert for ignored reason"
                );
                continue;
            }

            if !self.cache.admit(&Fingerprint::of(event)).await {
                info!(
                    sink = ALERTMANAGER_SINK,
                    reason = %event.reason,
                    name = %event.name,
                    "Skipping alert already sent within suppression window"
                );
                continue;
            }

            match Alert::from_event(&self.config.cluster, event) {
                Ok(alert) => alerts.push(alert),
                Err(e) => {
                    warn!(
                        sink = ALERTMANAGER_SINK,
                        error = %e,
                        namespace = %event.namespace,
                        name = %event.name,
                        "Failed to create alert from event"
                    );
                }
            }
        }

        alerts
    }

    /// POST `alerts` as one JSON array.
    async fn send(&self, alerts: &[Alert]) -> Result<StatusCode, DeliveryError> {
        let body = serde_json::to_vec(alerts)?;

        let response = self
            .client
            .post(self.config.url())
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .body(body)
            .send()
            .await?;

        Ok(response.status())
    }

    async fn deliver(&self, alerts: &[Alert]) {
        match self.send(alerts).await {
            Ok(status) => {
                info!(
                    sink = ALERTMANAGER_SINK,
                    count = alerts.len(),
                    status = %status,
                    "Alerts sent"
                );
            }
            Err(e) => {
                error!(
                    sink = ALERTMANAGER_SINK,
                    error = %e,
                    count = alerts.len(),
                    "Failed to send alerts to alertmanager"
                );
            }
        }
    }
}

#[async_trait]
impl EventSink for AlertmanagerSink {
    fn name(&self) -> &'static str {
        ALERTMANAGER_SINK
    }

    async fn export_events(&self, batch: &EventBatch) {
        let alerts = self.collect_alerts(batch).await;
        if alerts.is_empty() {
            debug!(sink = ALERTMANAGER_SINK, "No alerts to send");
            return;
        }

        match self.config.delivery {
            DeliveryMode::Batch => self.deliver(&alerts).await,
            DeliveryMode::PerEvent => {
                for alert in &alerts {
                    self.deliver(std::slice::from_ref(alert)).await;
                }
            }
        }
    }

    fn stop(&self) {
        // Nothing to release
    }
}
